//! Контексты отрисовки страниц.
//!
//! Шаблоны живут вне сервиса: каждая страница отдает JSON с именем страницы,
//! текущим пользователем, flash-сообщениями и данными.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::identity::session_store::Flash;
use crate::identity::Identity;
use crate::middleware::WebSession;
use crate::models::{Hall, Movie, MovieShowtime, ShowtimeListing};

pub const INDEX: &str = "index";
pub const REGISTER: &str = "register";
pub const LOGIN: &str = "login";
pub const ADMIN: &str = "admin";
pub const MOVIE_SESSIONS: &str = "movie_sessions";

#[derive(Debug, Serialize)]
pub struct PageContext<T: Serialize> {
    pub page: &'static str,
    pub identity: Option<Identity>,
    pub messages: Vec<Flash>,
    #[serde(flatten)]
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct IndexData {
    pub movies: Vec<Movie>,
}

#[derive(Debug, Serialize)]
pub struct AuthFormData {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminData {
    pub halls: Vec<Hall>,
    pub movies: Vec<Movie>,
    pub sessions: Vec<ShowtimeListing>,
}

#[derive(Debug, Serialize)]
pub struct MovieSessionsData {
    pub movie: Movie,
    pub sessions: Vec<MovieShowtime>,
}

/// Собирает контекст страницы; накопленные flash-сообщения забираются из сессии
pub fn render<T: Serialize>(page: &'static str, session: &mut WebSession, data: T) -> Response {
    let context = PageContext {
        page,
        identity: session.identity(),
        messages: session.take_flashes(),
        data,
    };
    Json(context).into_response()
}
