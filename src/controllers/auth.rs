use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use std::sync::Arc;
use tracing::error;

use crate::identity::{self, Credentials, IdentityError, IdentityService};
use crate::middleware::WebSession;
use crate::views::{self, AuthFormData};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .route("/account", get(account))
}

fn form_page(page: &'static str, session: &mut WebSession, message: Option<String>) -> Response {
    views::render(page, session, AuthFormData { message })
}

/* ---------- REGISTER ---------- */

// GET /register
async fn register_page(State(state): State<Arc<AppState>>, mut session: WebSession) -> Response {
    let response = form_page(views::REGISTER, &mut session, None);
    session.finish(&state, response).await
}

// POST /register
async fn register(
    State(state): State<Arc<AppState>>,
    mut session: WebSession,
    Form(credentials): Form<Credentials>,
) -> Response {
    let result = IdentityService::from_state(&state)
        .register(&mut session, &credentials)
        .await;

    let response = match result {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e @ (IdentityError::UsernameTaken | IdentityError::InvalidInput(_))) => {
            form_page(views::REGISTER, &mut session, Some(e.to_string()))
        }
        Err(e) => {
            error!("register failed: {:?}", e);
            form_page(views::REGISTER, &mut session, Some("Registration failed, please try again later.".to_string()))
        }
    };
    session.finish(&state, response).await
}

/* ---------- LOGIN ---------- */

// GET /login
async fn login_page(State(state): State<Arc<AppState>>, mut session: WebSession) -> Response {
    let response = form_page(views::LOGIN, &mut session, None);
    session.finish(&state, response).await
}

// POST /login
async fn login(
    State(state): State<Arc<AppState>>,
    mut session: WebSession,
    Form(credentials): Form<Credentials>,
) -> Response {
    let result = IdentityService::from_state(&state)
        .login(&mut session, &credentials)
        .await;

    let response = match result {
        Ok(_) => Redirect::to("/").into_response(),
        Err(IdentityError::InvalidCredentials) => {
            form_page(views::LOGIN, &mut session, Some(IdentityError::InvalidCredentials.to_string()))
        }
        Err(e) => {
            error!("login failed: {:?}", e);
            form_page(views::LOGIN, &mut session, Some("Login failed, please try again later.".to_string()))
        }
    };
    session.finish(&state, response).await
}

/* ---------- LOGOUT / ACCOUNT ---------- */

// GET /logout
async fn logout(State(state): State<Arc<AppState>>, mut session: WebSession) -> Response {
    identity::logout(&mut session);
    session.finish(&state, Redirect::to("/").into_response()).await
}

// GET /account
async fn account(session: WebSession) -> Response {
    match identity::current_identity(&session) {
        Some(user) => format!("Hello, {}! This is your account page.", user.username).into_response(),
        None => Redirect::to("/login").into_response(),
    }
}
