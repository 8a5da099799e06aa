use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use storefront_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        auth::RegisterRequest,
        cart::AddToCartRequest,
        inventory::CreateItemRequest,
    },
    entity::{
        inventory::ActiveModel as ItemActive, shopping_carts::ActiveModel as CartActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::Pagination,
    services::{auth_service, cart_service, inventory_service, order_service, user_service},
    state::AppState,
};
use uuid::Uuid;

// Integration flow: register -> add to cart (twice, same item) -> checkout;
// then constraint and cascade behavior around it.
#[tokio::test]
async fn cart_checkout_and_constraint_flow() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    // Registration provisions the cart in the same transaction.
    let username = format!("shopper-{}", Uuid::new_v4());
    let registered = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: username.clone(),
            password: "secret123".into(),
        },
    )
    .await?;
    let user_id = registered.data.unwrap().id;
    let cart_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM shopping_carts WHERE id = $1")
            .bind(user_id)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(cart_count.0, 1, "registration must provision exactly one cart");

    // A second registration under the same name is a unique violation.
    let dup = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username,
            password: "other456".into(),
        },
    )
    .await;
    assert!(matches!(dup, Err(AppError::UniqueViolation(_))));

    // Seed a catalog row.
    let product_name = format!("White T-Shirt {}", Uuid::new_v4());
    let item = inventory_service::create_item(
        &state,
        CreateItemRequest {
            product_name: product_name.clone(),
            description: "Classic white t-shirt, goes with every outfit.".into(),
            available: 10,
        },
    )
    .await?
    .data
    .unwrap();

    // Duplicate product name is a unique violation too.
    let dup_item = inventory_service::create_item(
        &state,
        CreateItemRequest {
            product_name,
            description: "same name".into(),
            available: 1,
        },
    )
    .await;
    assert!(matches!(dup_item, Err(AppError::UniqueViolation(_))));

    // Negative initial stock is rejected under the same classification the
    // CHECK (available >= 0) constraint carries.
    let negative_item = inventory_service::create_item(
        &state,
        CreateItemRequest {
            product_name: format!("Ghost Item {}", Uuid::new_v4()),
            description: "never stocked".into(),
            available: -1,
        },
    )
    .await;
    assert!(matches!(negative_item, Err(AppError::CheckViolation(_))));

    let auth_user = AuthUser { user_id };

    // Non-positive quantities are refused before they reach the store.
    let zero_quantity = cart_service::add_to_cart(
        &state.pool,
        &auth_user,
        AddToCartRequest {
            item_id: item.id,
            quantity: 0,
        },
    )
    .await;
    assert!(matches!(zero_quantity, Err(AppError::BadRequest(_))));

    // And the CHECK (quantity > 0) constraint backstops any path that skips
    // the gate, surfacing as a check violation.
    let raw_insert = sqlx::query(
        "INSERT INTO cart_items (id, cart_id, item_id, quantity) VALUES ($1, $2, $3, 0)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(item.id)
    .execute(&state.pool)
    .await;
    assert!(matches!(
        raw_insert.map_err(AppError::from),
        Err(AppError::CheckViolation(_))
    ));

    // Adding the same item twice updates the one line instead of inserting a
    // duplicate row.
    cart_service::add_to_cart(
        &state.pool,
        &auth_user,
        AddToCartRequest {
            item_id: item.id,
            quantity: 2,
        },
    )
    .await?;
    let line = cart_service::add_to_cart(
        &state.pool,
        &auth_user,
        AddToCartRequest {
            item_id: item.id,
            quantity: 3,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(line.quantity, 5);
    let line_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE cart_id = $1")
        .bind(user_id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(line_count.0, 1);

    // Asking for more than is available is rejected up front.
    let too_many = cart_service::add_to_cart(
        &state.pool,
        &auth_user,
        AddToCartRequest {
            item_id: item.id,
            quantity: 100,
        },
    )
    .await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));

    // Checkout decrements stock, writes the order and clears the cart.
    let checked_out = order_service::checkout(&state, &auth_user).await?.data.unwrap();
    assert_eq!(checked_out.items.len(), 1);
    assert_eq!(checked_out.items[0].quantity, 5);

    let remaining = inventory_service::get_item(&state, item.id)
        .await?
        .data
        .unwrap();
    assert_eq!(remaining.available, 5);

    let cart = cart_service::list_cart(
        &state.pool,
        &auth_user,
        Pagination {
            page: None,
            per_page: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(cart.items.is_empty(), "checkout must clear the cart");

    // A second checkout on the now-empty cart is rejected.
    let empty = order_service::checkout(&state, &auth_user).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    // History shows the order with its items grouped.
    let history = order_service::list_orders(
        &state,
        &auth_user,
        Pagination {
            page: None,
            per_page: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(history.items.len(), 1);
    assert_eq!(history.items[0].order.id, checked_out.order.id);
    assert_eq!(history.items[0].items.len(), 1);

    // Deleting the account cascades through cart, orders and their items.
    user_service::delete_account(&state.pool, &auth_user).await?;
    for (table, column) in [
        ("shopping_carts", "id"),
        ("orders", "user_id"),
    ] {
        let count: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {table} WHERE {column} = $1"
        ))
        .bind(user_id)
        .fetch_one(&state.pool)
        .await?;
        assert_eq!(count.0, 0, "no {table} rows may survive the user");
    }
    let orphan_items: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM order_items WHERE order_id = $1",
    )
    .bind(checked_out.order.id)
    .fetch_one(&state.pool)
    .await?;
    assert_eq!(orphan_items.0, 0, "order items must cascade with the order");

    // Deleting an inventory item removes its cart lines the same way.
    let survivor_id = create_user_with_cart(&state).await?;
    let survivor = AuthUser {
        user_id: survivor_id,
    };
    let doomed = create_item(&state, 4).await?;
    cart_service::add_to_cart(
        &state.pool,
        &survivor,
        AddToCartRequest {
            item_id: doomed.id,
            quantity: 1,
        },
    )
    .await?;
    inventory_service::delete_item(&state, doomed.id).await?;
    let lines: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE item_id = $1")
        .bind(doomed.id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(lines.0, 0);

    Ok(())
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(&database_url).await?;

    Ok(Some(AppState { pool, orm }))
}

async fn create_user_with_cart(state: &AppState) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let user = UserActive {
        id: Set(id),
        username: Set(format!("user-{id}")),
        hashed_pwd: Set("dummy".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    CartActive { id: Set(user.id) }.insert(&state.orm).await?;

    Ok(user.id)
}

async fn create_item(
    state: &AppState,
    available: i32,
) -> anyhow::Result<storefront_api::entity::inventory::Model> {
    let id = Uuid::new_v4();
    let item = ItemActive {
        id: Set(id),
        available: Set(available),
        product_name: Set(format!("Test Widget {id}")),
        description: Set("A product for testing".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(item)
}
