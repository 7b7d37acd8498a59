//! Создает учетную запись администратора, если ее еще нет.
//!
//! Использует DATABASE_URL, ADMIN_USERNAME (по умолчанию "admin"),
//! ADMIN_PASSWORD и BCRYPT_COST.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_admin::{
    config::{AdminSeedConfig, DatabaseConfig},
    database::Database,
    identity::IdentityService,
    store::postgres::PgCatalog,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "cinema_admin=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // одному скрипту хватает одного соединения
    let db_config = DatabaseConfig { pool_size: 1, ..DatabaseConfig::from_env()? };
    let seed = AdminSeedConfig::from_env();
    let password = seed.password.context("ADMIN_PASSWORD must be set")?;
    let bcrypt_cost = match std::env::var("BCRYPT_COST") {
        Ok(raw) => raw.parse().context("BCRYPT_COST must be a number")?,
        Err(_) => bcrypt::DEFAULT_COST,
    };

    let db = Database::connect(&db_config).await?;
    db.migrate().await?;
    let catalog = PgCatalog::new(&db);

    let created = IdentityService::new(&catalog, bcrypt_cost)
        .seed_admin(&seed.username, &password)
        .await?;

    if created {
        println!("Admin '{}' created successfully!", seed.username);
    } else {
        println!("User '{}' already exists.", seed.username);
    }
    Ok(())
}
