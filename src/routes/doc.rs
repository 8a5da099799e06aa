use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{CartLine, CartList},
        inventory::{AdjustStockRequest, CreateItemRequest, ItemList, UpdateItemRequest},
        orders::{OrderList, OrderWithItems},
    },
    models::{CartItem, InventoryItem, Order, OrderItem, ShoppingCart, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, inventory, orders, params, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::clear_cart,
        inventory::list_items,
        inventory::create_item,
        inventory::get_item,
        inventory::update_item,
        inventory::adjust_stock,
        inventory::delete_item,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        users::delete_account,
    ),
    components(
        schemas(
            User,
            InventoryItem,
            CartItem,
            ShoppingCart,
            Order,
            OrderItem,
            CartLine,
            CartList,
            CreateItemRequest,
            UpdateItemRequest,
            AdjustStockRequest,
            ItemList,
            OrderList,
            OrderWithItems,
            params::Pagination,
            params::ItemQuery,
            Meta,
            ApiResponse<InventoryItem>,
            ApiResponse<ItemList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CartList>,
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Inventory", description = "Inventory item endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order history endpoints"),
        (name = "Users", description = "Account endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
