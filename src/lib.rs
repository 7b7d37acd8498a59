pub mod config;
pub mod controllers;
pub mod database;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod services;
pub mod store;
pub mod views;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use identity::session_store::{RedisSessionStore, SessionStore};
use services::posters::PosterStorage;
use store::{postgres::PgCatalog, CatalogStore};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub posters: PosterStorage,
    pub config: config::Config,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::connect(&config.database).await?;
        db.migrate().await?;

        let redis = redis_client::RedisClient::new(&config.redis.url).await?;
        info!("Redis connected");

        let posters = PosterStorage::new(&config.uploads.dir);
        posters.ensure_dir().await?;

        Ok(Arc::new(Self {
            catalog: Arc::new(PgCatalog::new(&db)),
            sessions: Arc::new(RedisSessionStore::new(redis)),
            posters,
            config,
        }))
    }
}

/// Роутер приложения: страницы, health-check и раздача загруженных постеров
pub fn app(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(state.posters.dir());

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(controllers::routes(&state.config))
        .nest_service("/static/uploads", uploads)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
