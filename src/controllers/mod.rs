pub mod admin;
pub mod auth;
pub mod movies;

use axum::Router;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::error;

use crate::config::Config;
use crate::AppState;

pub fn routes(config: &Config) -> Router<Arc<AppState>> {
    Router::new()
        .merge(movies::routes())
        .merge(auth::routes())
        .merge(admin::routes(config.uploads.max_bytes))
}

// Страница отрисовывается и без данных: ошибка списка превращается в пустой список
fn or_empty<T, E: Debug>(result: Result<Vec<T>, E>, what: &str, failed: &mut bool) -> Vec<T> {
    result.unwrap_or_else(|e| {
        error!("failed to load {}: {:?}", what, e);
        *failed = true;
        Vec::new()
    })
}
