use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::BytesRejection,
        DefaultBodyLimit, FromRequest, Multipart, Request, State,
    },
    http::header,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::or_empty;
use crate::identity::{require_role, session_store::Flash};
use crate::middleware::WebSession;
use crate::models::Role;
use crate::services::admin::{AdminAction, AdminForm, AdminWorkflow, Upload, DATABASE_ERROR};
use crate::views::{self, AdminData};
use crate::AppState;

pub fn routes(max_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(dashboard).post(submit))
        .layer(DefaultBodyLimit::max(max_bytes))
}

#[derive(Debug, Error)]
enum BodyError {
    #[error("{0}")]
    MultipartRejected(#[from] MultipartRejection),
    #[error("{0}")]
    Multipart(#[from] MultipartError),
    #[error("{0}")]
    Body(#[from] BytesRejection),
    #[error("{0}")]
    Encoding(#[from] serde_urlencoded::de::Error),
}

// GET /admin
async fn dashboard(State(state): State<Arc<AppState>>, mut session: WebSession) -> Response {
    if require_role(&session, Role::Admin).is_none() {
        debug!("non-admin visit to /admin redirected");
        return Redirect::to("/").into_response();
    }

    let mut failed = false;
    let halls = or_empty(state.catalog.list_halls_ordered().await, "halls", &mut failed);
    let movies = or_empty(state.catalog.list_movies_ordered().await, "movies", &mut failed);
    let sessions = or_empty(state.catalog.list_sessions_joined().await, "sessions", &mut failed);
    if failed {
        session.flash(Flash::danger(DATABASE_ERROR));
    }

    let response = views::render(views::ADMIN, &mut session, AdminData { halls, movies, sessions });
    session.finish(&state, response).await
}

// POST /admin - одно действие на запрос, затем редирект обратно на панель
async fn submit(State(state): State<Arc<AppState>>, mut session: WebSession, request: Request) -> Response {
    // Роль проверяется до чтения тела
    let Some(admin) = require_role(&session, Role::Admin) else {
        warn!("admin action rejected for {:?}", session.identity().map(|i| i.username));
        return Redirect::to("/").into_response();
    };

    let flash = match read_admin_form(&state, request).await {
        Ok(form) => match AdminAction::from_form(form) {
            Ok(action) => {
                debug!("admin {} submits {:?}", admin.username, action);
                AdminWorkflow::new(state.catalog.as_ref(), &state.posters).apply(action).await
            }
            Err(e) => Flash::danger(format!("Invalid form data: {}", e)),
        },
        Err(e) => {
            warn!("unreadable admin form: {}", e);
            Flash::danger(format!("Invalid form data: {}", e))
        }
    };

    session.flash(flash);
    session.finish(&state, Redirect::to("/admin").into_response()).await
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

async fn read_admin_form(state: &Arc<AppState>, request: Request) -> Result<AdminForm, BodyError> {
    if !is_multipart(&request) {
        let body = Bytes::from_request(request, state).await?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&body)?;
        return Ok(AdminForm { fields: pairs.into_iter().collect(), poster: None });
    }

    let mut multipart = Multipart::from_request(request, state).await?;
    let mut fields = HashMap::new();
    let mut poster = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "poster" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            // пустое поле файла = постер не выбран
            if !filename.is_empty() {
                poster = Some(Upload { filename, bytes: bytes.to_vec() });
            }
        } else {
            fields.insert(name, field.text().await?);
        }
    }

    Ok(AdminForm { fields, poster })
}
