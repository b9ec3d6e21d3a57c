use chrono::Duration;
use rust_decimal::Decimal;
use storefront_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    middleware::{auth::issue_token, permissions::Role},
};

const STAFF_USER_ID: i64 = 1;
const CUSTOMER_USER_ID: i64 = 42;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.max_connections).await?;
    // Ensure migrations are applied.
    run_migrations(&orm_from_pool(pool.clone())).await?;

    let apparel = ensure_collection(&pool, "Apparel").await?;
    let kitchen = ensure_collection(&pool, "Kitchen").await?;
    seed_products(&pool, apparel, kitchen).await?;

    let ttl = Duration::days(7);
    let staff = issue_token(&config.jwt_secret, STAFF_USER_ID, Role::Staff, ttl)?;
    let customer = issue_token(&config.jwt_secret, CUSTOMER_USER_ID, Role::Customer, ttl)?;

    println!("Seed completed.");
    println!("Staff token (user {STAFF_USER_ID}): {staff}");
    println!("Customer token (user {CUSTOMER_USER_ID}): {customer}");
    Ok(())
}

async fn ensure_collection(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<i64> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM collections WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO collections (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await?;

    println!("Ensured collection {name} (id={id})");
    Ok(id)
}

async fn seed_products(pool: &sqlx::PgPool, apparel: i64, kitchen: i64) -> anyhow::Result<()> {
    let products = vec![
        ("Axum Hoodie", "axum-hoodie", "Warm hoodie for Rustaceans", 5500, 50, apparel),
        ("Rust Sticker Pack", "rust-sticker-pack", "Decorate your laptop", 500, 200, apparel),
        ("Ferris Mug", "ferris-mug", "Coffee tastes better with Ferris", 1200, 100, kitchen),
        ("Borrow Checker Apron", "borrow-checker-apron", "Keeps the kitchen memory safe", 2450, 5, kitchen),
    ];

    for (title, slug, description, cents, inventory, collection_id) in products {
        sqlx::query(
            r#"
            INSERT INTO products (title, slug, description, unit_price, inventory, collection_id)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE slug = $2)
            "#,
        )
        .bind(title)
        .bind(slug)
        .bind(description)
        .bind(Decimal::new(cents, 2))
        .bind(inventory)
        .bind(collection_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
