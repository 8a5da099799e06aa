use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::InventoryItem;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    pub product_name: String,
    pub description: String,
    pub available: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub product_name: Option<String>,
    pub description: Option<String>,
}

/// Signed stock adjustment; a delta that would take `available` below zero
/// is rejected in a single compare-and-swap update.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    pub delta: i32,
}

#[derive(Serialize, ToSchema)]
pub struct ItemList {
    pub items: Vec<InventoryItem>,
}
