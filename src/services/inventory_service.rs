use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::inventory::{AdjustStockRequest, CreateItemRequest, ItemList, UpdateItemRequest},
    entity::inventory::{Column, Entity as Inventory, ActiveModel, Model as ItemModel},
    error::{AppError, AppResult},
    models::InventoryItem,
    response::{ApiResponse, Meta},
    routes::params::{ItemQuery, ItemSortBy, SortOrder},
    state::AppState,
};

pub async fn list_items(state: &AppState, query: ItemQuery) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::ProductName).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    let sort_by = query.sort_by.unwrap_or(ItemSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ItemSortBy::CreatedAt => Column::CreatedAt,
        ItemSortBy::ProductName => Column::ProductName,
        ItemSortBy::Available => Column::Available,
    };

    let mut finder = Inventory::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(item_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Items", ItemList { items }, Some(meta)))
}

pub async fn get_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<InventoryItem>> {
    let item = Inventory::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(item_from_entity);
    let item = match item {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Item", item, None))
}

pub async fn create_item(
    state: &AppState,
    payload: CreateItemRequest,
) -> AppResult<ApiResponse<InventoryItem>> {
    // Same classification the CHECK (available >= 0) constraint would give.
    if payload.available < 0 {
        return Err(AppError::CheckViolation(
            "available must not be negative".to_string(),
        ));
    }
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        available: Set(payload.available),
        product_name: Set(payload.product_name),
        description: Set(payload.description),
        created_at: NotSet,
    };
    // A duplicate product_name comes back as a unique violation.
    let item = active.insert(&state.orm).await?;

    tracing::info!(item_id = %item.id, "created inventory item");
    Ok(ApiResponse::success(
        "Item created",
        item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn update_item(
    state: &AppState,
    id: Uuid,
    payload: UpdateItemRequest,
) -> AppResult<ApiResponse<InventoryItem>> {
    let existing = Inventory::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(product_name) = payload.product_name {
        active.product_name = Set(product_name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }

    let item = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        item_from_entity(item),
        Some(Meta::empty()),
    ))
}

/// Apply a signed stock delta as a single compare-and-swap update. The
/// `available + delta >= 0` predicate keeps concurrent adjustments from ever
/// committing a negative count.
pub async fn adjust_stock(
    state: &AppState,
    id: Uuid,
    payload: AdjustStockRequest,
) -> AppResult<ApiResponse<InventoryItem>> {
    let updated: Option<InventoryItem> = sqlx::query_as(
        r#"
        UPDATE inventory
        SET available = available + $2
        WHERE id = $1 AND available + $2 >= 0
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.delta)
    .fetch_optional(&state.pool)
    .await?;

    if let Some(item) = updated {
        tracing::info!(item_id = %id, delta = payload.delta, "adjusted stock");
        return Ok(ApiResponse::success("Stock adjusted", item, Some(Meta::empty())));
    }

    // No row matched: either the item is gone or the delta would have made
    // available negative.
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM inventory WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    match exists {
        Some(_) => Err(AppError::CheckViolation(
            "stock adjustment would make available negative".to_string(),
        )),
        None => Err(AppError::NotFound),
    }
}

pub async fn delete_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<serde_json::Value>> {
    // Dependent order_items and cart_items go with it via ON DELETE CASCADE.
    let result = Inventory::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(item_id = %id, "deleted inventory item");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn item_from_entity(model: ItemModel) -> InventoryItem {
    InventoryItem {
        id: model.id,
        available: model.available,
        product_name: model.product_name,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
