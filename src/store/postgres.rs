use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use tracing::debug;

use super::{CascadeDelete, CatalogStore, StoreError};
use crate::database::Database;
use crate::models::{
    Hall, Movie, MovieShowtime, NewHall, NewMovie, NewShowtime, Role, Showtime, ShowtimeListing,
    User,
};

#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(db: &Database) -> Self {
        Self { pool: db.pool.clone() }
    }
}

// Разбор ошибок ограничений Postgres в доменные ошибки
fn classify(err: sqlx::Error, entity: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(entity);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference;
        }
        if db_err.is_check_violation() {
            return StoreError::Rejected;
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl CatalogStore for PgCatalog {
    /* ---------- USERS ---------- */

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, username: &str, password_hash: &str, role: Role) -> Result<i32, StoreError> {
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO users (username, password, role) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "user"))
    }

    /* ---------- HALLS ---------- */

    async fn list_halls_ordered(&self) -> Result<Vec<Hall>, StoreError> {
        let halls = sqlx::query_as::<_, Hall>(
            "SELECT id, name, rows, seats_per_row FROM halls ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(halls)
    }

    async fn find_hall_by_name(&self, name: &str) -> Result<Option<Hall>, StoreError> {
        let hall = sqlx::query_as::<_, Hall>(
            "SELECT id, name, rows, seats_per_row FROM halls WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hall)
    }

    async fn insert_hall(&self, hall: &NewHall) -> Result<i32, StoreError> {
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO halls (name, rows, seats_per_row) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&hall.name)
        .bind(hall.rows)
        .bind(hall.seats_per_row)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "hall"))
    }

    async fn delete_hall(&self, hall_id: i32) -> Result<CascadeDelete, StoreError> {
        let mut tx = self.pool.begin().await?;

        // 1) Сначала сеансы, чтобы не осталось сирот
        let sessions_removed = sqlx::query("DELETE FROM sessions WHERE hall_id = $1")
            .bind(hall_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        // 2) Затем сам зал
        let parent_removed = sqlx::query("DELETE FROM halls WHERE id = $1")
            .bind(hall_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        tx.commit().await?;
        debug!("delete_hall {}: {} sessions removed", hall_id, sessions_removed);

        Ok(CascadeDelete { sessions_removed, parent_removed })
    }

    /* ---------- MOVIES ---------- */

    async fn list_movies_ordered(&self) -> Result<Vec<Movie>, StoreError> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT id, title, genre, description, duration, poster FROM movies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT id, title, genre, description, duration, poster FROM movies WHERE title = $1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn get_movie(&self, movie_id: i32) -> Result<Option<Movie>, StoreError> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT id, title, genre, description, duration, poster FROM movies WHERE id = $1",
        )
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn insert_movie(&self, movie: &NewMovie) -> Result<i32, StoreError> {
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO movies (title, genre, description, duration, poster)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(&movie.title)
        .bind(&movie.genre)
        .bind(&movie.description)
        .bind(movie.duration)
        .bind(&movie.poster)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "movie"))
    }

    async fn delete_movie(&self, movie_id: i32) -> Result<CascadeDelete, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sessions_removed = sqlx::query("DELETE FROM sessions WHERE movie_id = $1")
            .bind(movie_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let parent_removed = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(movie_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        tx.commit().await?;
        debug!("delete_movie {}: {} sessions removed", movie_id, sessions_removed);

        Ok(CascadeDelete { sessions_removed, parent_removed })
    }

    async fn get_movie_poster(&self, movie_id: i32) -> Result<Option<String>, StoreError> {
        let poster = sqlx::query_scalar::<_, Option<String>>("SELECT poster FROM movies WHERE id = $1")
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(poster.flatten())
    }

    async fn list_poster_filenames(&self) -> Result<Vec<String>, StoreError> {
        let posters = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT poster FROM movies WHERE poster IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(posters)
    }

    /* ---------- SESSIONS ---------- */

    async fn list_sessions_joined(&self) -> Result<Vec<ShowtimeListing>, StoreError> {
        let rows = sqlx::query_as::<_, ShowtimeListing>(
            r#"
            SELECT s.id, s.movie_id, s.hall_id,
                   m.title AS movie_title, h.name AS hall_name,
                   s.datetime, s.price
            FROM sessions s
            JOIN movies m ON m.id = s.movie_id
            JOIN halls h ON h.id = s.hall_id
            ORDER BY s.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_session(
        &self,
        movie_id: i32,
        hall_id: i32,
        datetime: NaiveDateTime,
    ) -> Result<Option<Showtime>, StoreError> {
        let session = sqlx::query_as::<_, Showtime>(
            "SELECT id, movie_id, hall_id, datetime, price FROM sessions
             WHERE movie_id = $1 AND hall_id = $2 AND datetime = $3",
        )
        .bind(movie_id)
        .bind(hall_id)
        .bind(datetime)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn insert_session(&self, session: &NewShowtime) -> Result<i32, StoreError> {
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO sessions (movie_id, hall_id, datetime, price)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(session.movie_id)
        .bind(session.hall_id)
        .bind(session.datetime)
        .bind(session.price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "session"))
    }

    async fn delete_session(&self, session_id: i32) -> Result<bool, StoreError> {
        let affected = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn list_sessions_for_hall(&self, hall_id: i32) -> Result<Vec<Showtime>, StoreError> {
        let rows = sqlx::query_as::<_, Showtime>(
            "SELECT id, movie_id, hall_id, datetime, price FROM sessions WHERE hall_id = $1 ORDER BY id",
        )
        .bind(hall_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_sessions_for_movie(&self, movie_id: i32) -> Result<Vec<Showtime>, StoreError> {
        let rows = sqlx::query_as::<_, Showtime>(
            "SELECT id, movie_id, hall_id, datetime, price FROM sessions WHERE movie_id = $1 ORDER BY id",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /* ---------- PUBLIC BROWSING ---------- */

    async fn list_movies_with_sessions(&self) -> Result<Vec<Movie>, StoreError> {
        let movies = sqlx::query_as::<_, Movie>(
            r#"
            SELECT m.id, m.title, m.genre, m.description, m.duration, m.poster
            FROM movies m
            WHERE EXISTS (SELECT 1 FROM sessions s WHERE s.movie_id = m.id)
            ORDER BY m.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn get_movie_with_sessions(
        &self,
        movie_id: i32,
    ) -> Result<Option<(Movie, Vec<MovieShowtime>)>, StoreError> {
        let Some(movie) = self.get_movie(movie_id).await? else {
            return Ok(None);
        };

        let sessions = sqlx::query_as::<_, MovieShowtime>(
            r#"
            SELECT s.id, s.hall_id, h.name AS hall_name, s.datetime, s.price
            FROM sessions s
            JOIN halls h ON h.id = s.hall_id
            WHERE s.movie_id = $1
            ORDER BY s.datetime, s.id
            "#,
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some((movie, sessions)))
    }
}
