use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;

/// Пул соединений Postgres с каталогом кинотеатра.
///
/// Соединение берется из пула на время одного запроса и сразу возвращается.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size.max(1))
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(300))
            .connect(&config.url)
            .await?;
        info!("Postgres pool ready ({} connections max)", config.pool_size.max(1));
        Ok(Database { pool })
    }

    /// Схема каталога: users, halls, movies, sessions
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        let migrator = sqlx::migrate!("./src/migrations");
        info!("Applying {} catalog migrations", migrator.iter().count());
        migrator.run(&self.pool).await
    }
}
