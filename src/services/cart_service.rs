use chrono::DateTime;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::cart::{AddToCartRequest, CartLine, CartList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, InventoryItem},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

#[derive(FromRow)]
struct CartLineRow {
    line_id: Uuid,
    quantity: i32,
    item_id: Uuid,
    available: i32,
    product_name: String,
    description: String,
    created_at: DateTime<chrono::Utc>,
}

pub async fn list_cart(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartList>> {
    let (page, limit, offset) = pagination.normalize();
    let rows = sqlx::query_as::<_, CartLineRow>(
        r#"
        SELECT ci.id AS line_id, ci.quantity,
               i.id AS item_id, i.available, i.product_name, i.description, i.created_at
        FROM cart_items ci
        JOIN inventory i ON i.id = ci.item_id
        WHERE ci.cart_id = $1
        ORDER BY i.product_name
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE cart_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let items = rows
        .into_iter()
        .map(|row| CartLine {
            id: row.line_id,
            item: InventoryItem {
                id: row.item_id,
                available: row.available,
                product_name: row.product_name,
                description: row.description,
                created_at: row.created_at,
            },
            quantity: row.quantity,
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

/// Add an item to the caller's cart. Adding an item that is already there
/// increments the existing line instead of inserting a duplicate row; the
/// UNIQUE (cart_id, item_id) constraint backs the upsert.
pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let available: Option<(i32,)> = sqlx::query_as("SELECT available FROM inventory WHERE id = $1")
        .bind(payload.item_id)
        .fetch_optional(pool)
        .await?;
    let available = match available {
        Some((n,)) => n,
        None => return Err(AppError::BadRequest("item not found".to_string())),
    };

    // Advisory gate against the stock visible right now; the authoritative
    // re-check happens inside the checkout transaction.
    if payload.quantity > available {
        return Err(AppError::BadRequest(format!(
            "requested quantity {} exceeds available stock {}",
            payload.quantity, available
        )));
    }

    let cart_item: CartItem = sqlx::query_as(
        r#"
        INSERT INTO cart_items (id, cart_id, item_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (cart_id, item_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.item_id)
    .bind(payload.quantity)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        user_id = %user.user_id,
        item_id = %payload.item_id,
        quantity = cart_item.quantity,
        "cart updated"
    );
    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND item_id = $2")
        .bind(user.user_id)
        .bind(item_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(user.user_id)
        .execute(pool)
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        removed = result.rows_affected(),
        "cart cleared"
    );
    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": result.rows_affected() }),
        Some(Meta::empty()),
    ))
}
