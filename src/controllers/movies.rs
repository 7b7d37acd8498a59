use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::error;

use super::or_empty;
use crate::identity::session_store::Flash;
use crate::middleware::WebSession;
use crate::services::admin::DATABASE_ERROR;
use crate::views::{self, IndexData, MovieSessionsData};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/movie/{movie_id}", get(movie_sessions))
}

// GET / - фильмы, у которых есть хотя бы один сеанс
async fn home(State(state): State<Arc<AppState>>, mut session: WebSession) -> Response {
    let mut failed = false;
    let movies = or_empty(state.catalog.list_movies_with_sessions().await, "movies", &mut failed);
    if failed {
        session.flash(Flash::danger(DATABASE_ERROR));
    }

    let response = views::render(views::INDEX, &mut session, IndexData { movies });
    session.finish(&state, response).await
}

// GET /movie/{id} - карточка фильма и его сеансы по времени
async fn movie_sessions(
    State(state): State<Arc<AppState>>,
    mut session: WebSession,
    Path(movie_id): Path<i32>,
) -> Response {
    let response = match state.catalog.get_movie_with_sessions(movie_id).await {
        Ok(Some((movie, sessions))) => {
            views::render(views::MOVIE_SESSIONS, &mut session, MovieSessionsData { movie, sessions })
        }
        Ok(None) => {
            session.flash(Flash::warning("Movie not found!"));
            Redirect::to("/").into_response()
        }
        Err(e) => {
            error!("movie_sessions {} sql error: {:?}", movie_id, e);
            session.flash(Flash::danger(DATABASE_ERROR));
            Redirect::to("/").into_response()
        }
    };
    session.finish(&state, response).await
}
