use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

#[derive(Debug, FromRow)]
struct CartRow {
    item_id: Uuid,
    quantity: i32,
}

/// Convert the caller's cart into an order.
///
/// Everything runs in one transaction: stock decrements, the order row, its
/// items and the cart clear either all commit or all roll back. The decrement
/// is a compare-and-swap (`available >= quantity` baked into the UPDATE), so
/// concurrent checkouts of the same item can never drive `available` negative;
/// the loser gets an out-of-stock error and no partial decrement survives.
pub async fn checkout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderWithItems>> {
    let mut txn = state.pool.begin().await?;

    // Decrements below lock inventory rows in cart-line order; a stable order
    // keeps concurrent checkouts with overlapping carts from deadlocking.
    let lines: Vec<CartRow> = sqlx::query_as(
        "SELECT item_id, quantity FROM cart_items WHERE cart_id = $1 ORDER BY item_id",
    )
    .bind(user.user_id)
    .fetch_all(&mut *txn)
    .await?;

    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    for line in &lines {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET available = available - $2
            WHERE id = $1 AND available >= $2
            "#,
        )
        .bind(line.item_id)
        .bind(line.quantity)
        .execute(&mut *txn)
        .await?;

        if result.rows_affected() == 0 {
            // Returning drops the transaction, rolling back any decrements
            // already applied for earlier lines.
            return Err(AppError::OutOfStock {
                item_id: line.item_id,
            });
        }
    }

    let order: Order =
        sqlx::query_as("INSERT INTO orders (id, user_id) VALUES ($1, $2) RETURNING *")
            .bind(Uuid::new_v4())
            .bind(user.user_id)
            .fetch_one(&mut *txn)
            .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for line in &lines {
        let item: OrderItem = sqlx::query_as(
            r#"
            INSERT INTO order_items (id, order_id, item_id, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order.id)
        .bind(line.item_id)
        .bind(line.quantity)
        .fetch_one(&mut *txn)
        .await?;
        items.push(item);
    }

    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(user.user_id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    tracing::info!(user_id = %user.user_id, order_id = %order.id, "checkout committed");
    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

/// The caller's purchase history, newest first, each order grouped with its
/// items.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::PurchaseDate);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders: Vec<OrderModel> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    if !order_ids.is_empty() {
        for item in OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(order_ids))
            .all(&state.orm)
            .await?
        {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(order_item_from_entity(item));
        }
    }

    let items = orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems {
                order: order_from_entity(order),
                items,
            }
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        purchase_date: model.purchase_date.with_timezone(&Utc),
        user_id: model.user_id,
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        item_id: model.item_id,
        quantity: model.quantity,
    }
}
