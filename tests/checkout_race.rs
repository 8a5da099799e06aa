use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use storefront_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::cart::AddToCartRequest,
    entity::{
        inventory::ActiveModel as ItemActive, shopping_carts::ActiveModel as CartActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{cart_service, order_service},
    state::AppState,
};
use uuid::Uuid;

// Two concurrent checkouts each want 2 of an item with available = 2: exactly
// one may win, the other gets a stock-exhaustion error, and available ends at
// 0 -- never negative.
#[tokio::test]
async fn concurrent_checkouts_cannot_oversell() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(&database_url).await?;
    let state = AppState { pool, orm };

    let item_id = Uuid::new_v4();
    ItemActive {
        id: Set(item_id),
        available: Set(2),
        product_name: Set(format!("Black Jeans {item_id}")),
        description: Set("Durable jeans!".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let first = create_user_with_cart(&state).await?;
    let second = create_user_with_cart(&state).await?;

    for user in [&first, &second] {
        cart_service::add_to_cart(
            &state.pool,
            user,
            AddToCartRequest {
                item_id,
                quantity: 2,
            },
        )
        .await?;
    }

    let (a, b) = tokio::join!(
        order_service::checkout(&state, &first),
        order_service::checkout(&state, &second),
    );

    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one checkout may succeed");

    let loser = if a.is_err() { a } else { b };
    assert!(matches!(
        loser,
        Err(AppError::OutOfStock { item_id: id }) if id == item_id
    ));

    let available: (i32,) = sqlx::query_as("SELECT available FROM inventory WHERE id = $1")
        .bind(item_id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(available.0, 0);

    // Carts sharing two items must also settle cleanly: decrements follow a
    // stable item order, so concurrent checkouts never take the two inventory
    // row locks in opposite orders.
    let shirt = create_item(&state, "White T-Shirt", 5).await?;
    let jeans = create_item(&state, "Blue Jeans", 5).await?;

    let third = create_user_with_cart(&state).await?;
    let fourth = create_user_with_cart(&state).await?;

    // Fill the two carts in opposite insert orders.
    for (user, items) in [(&third, [shirt, jeans]), (&fourth, [jeans, shirt])] {
        for item_id in items {
            cart_service::add_to_cart(
                &state.pool,
                user,
                AddToCartRequest {
                    item_id,
                    quantity: 1,
                },
            )
            .await?;
        }
    }

    let (c, d) = tokio::join!(
        order_service::checkout(&state, &third),
        order_service::checkout(&state, &fourth),
    );
    assert!(c.is_ok(), "overlapping checkout must not abort: {c:?}");
    assert!(d.is_ok(), "overlapping checkout must not abort: {d:?}");

    for item_id in [shirt, jeans] {
        let available: (i32,) = sqlx::query_as("SELECT available FROM inventory WHERE id = $1")
            .bind(item_id)
            .fetch_one(&state.pool)
            .await?;
        assert_eq!(available.0, 3);
    }

    Ok(())
}

async fn create_item(state: &AppState, name: &str, available: i32) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    ItemActive {
        id: Set(id),
        available: Set(available),
        product_name: Set(format!("{name} {id}")),
        description: Set("A product for testing".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

async fn create_user_with_cart(state: &AppState) -> anyhow::Result<AuthUser> {
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

    Ok(AuthUser { user_id: user.id })
}
