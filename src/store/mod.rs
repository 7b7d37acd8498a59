//! Каталог: пользователи, залы, фильмы и сеансы.
//!
//! Контроллеры и сервисы работают через трейт [`CatalogStore`]; в продакшене
//! за ним стоит Postgres ([`postgres::PgCatalog`]), в юнит-тестах - хранилище
//! в памяти с теми же ограничениями уникальности и каскадами.

pub mod postgres;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::{
    Hall, Movie, MovieShowtime, NewHall, NewMovie, NewShowtime, Role, Showtime, ShowtimeListing,
    User,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Нарушено ограничение уникальности
    #[error("{0} already exists")]
    Conflict(&'static str),
    /// Внешний ключ указывает на несуществующую строку
    #[error("referenced row does not exist")]
    MissingReference,
    /// Нарушено CHECK-ограничение
    #[error("value rejected by storage constraint")]
    Rejected,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Результат каскадного удаления родителя (зала или фильма)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CascadeDelete {
    pub sessions_removed: u64,
    pub parent_removed: bool,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    // --- users ---
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn insert_user(&self, username: &str, password_hash: &str, role: Role) -> Result<i32, StoreError>;

    // --- halls ---
    async fn list_halls_ordered(&self) -> Result<Vec<Hall>, StoreError>;
    async fn find_hall_by_name(&self, name: &str) -> Result<Option<Hall>, StoreError>;
    async fn insert_hall(&self, hall: &NewHall) -> Result<i32, StoreError>;
    /// Удаляет сеансы зала и сам зал в одной транзакции
    async fn delete_hall(&self, hall_id: i32) -> Result<CascadeDelete, StoreError>;

    // --- movies ---
    async fn list_movies_ordered(&self) -> Result<Vec<Movie>, StoreError>;
    async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError>;
    async fn get_movie(&self, movie_id: i32) -> Result<Option<Movie>, StoreError>;
    async fn insert_movie(&self, movie: &NewMovie) -> Result<i32, StoreError>;
    /// Удаляет сеансы фильма и сам фильм в одной транзакции
    async fn delete_movie(&self, movie_id: i32) -> Result<CascadeDelete, StoreError>;
    async fn get_movie_poster(&self, movie_id: i32) -> Result<Option<String>, StoreError>;
    async fn list_poster_filenames(&self) -> Result<Vec<String>, StoreError>;

    // --- sessions (сеансы показа) ---
    async fn list_sessions_joined(&self) -> Result<Vec<ShowtimeListing>, StoreError>;
    async fn find_session(
        &self,
        movie_id: i32,
        hall_id: i32,
        datetime: NaiveDateTime,
    ) -> Result<Option<Showtime>, StoreError>;
    async fn insert_session(&self, session: &NewShowtime) -> Result<i32, StoreError>;
    async fn delete_session(&self, session_id: i32) -> Result<bool, StoreError>;
    async fn list_sessions_for_hall(&self, hall_id: i32) -> Result<Vec<Showtime>, StoreError>;
    async fn list_sessions_for_movie(&self, movie_id: i32) -> Result<Vec<Showtime>, StoreError>;

    // --- public browsing ---
    async fn list_movies_with_sessions(&self) -> Result<Vec<Movie>, StoreError>;
    /// Сеансы отсортированы по времени начала
    async fn get_movie_with_sessions(
        &self,
        movie_id: i32,
    ) -> Result<Option<(Movie, Vec<MovieShowtime>)>, StoreError>;
}
