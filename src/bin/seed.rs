use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use storefront_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let user_id = ensure_user(&pool, "demo", "demo123").await?;
    seed_inventory(&pool).await?;

    println!("Seed completed. Demo user ID: {user_id}");
    Ok(())
}

async fn ensure_user(pool: &sqlx::PgPool, username: &str, password: &str) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hashed_pwd = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, hashed_pwd)
        VALUES ($1, $2, $3)
        ON CONFLICT (username) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(hashed_pwd)
    .fetch_optional(pool)
    .await?;

    // If the user already exists, fetch its id.
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE username = $1")
                .bind(username)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    // Every user owns exactly one cart with the same id.
    sqlx::query("INSERT INTO shopping_carts (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(user_id)
        .execute(pool)
        .await?;

    println!("Ensured user {username}");
    Ok(user_id)
}

async fn seed_inventory(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let items = vec![
        (
            "White T-Shirt",
            "Classic white t-shirt, goes with every outfit.",
            10,
        ),
        ("Black Jeans", "Durable jeans!", 2),
    ];

    for (name, desc, available) in items {
        sqlx::query(
            r#"
            INSERT INTO inventory (id, available, product_name, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(available)
        .bind(name)
        .bind(desc)
        .execute(pool)
        .await?;
    }

    println!("Seeded inventory");
    Ok(())
}
