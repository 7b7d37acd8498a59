//! Хранилище каталога в памяти для юнит-тестов.
//!
//! Повторяет ограничения схемы Postgres: уникальность, внешние ключи,
//! CHECK на цену и каскадное удаление сеансов.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Mutex;

use super::{CascadeDelete, CatalogStore, StoreError};
use crate::models::{
    Hall, Movie, MovieShowtime, NewHall, NewMovie, NewShowtime, Role, Showtime, ShowtimeListing,
    User, MAX_PRICE,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    halls: Vec<Hall>,
    movies: Vec<Movie>,
    sessions: Vec<Showtime>,
    next_id: i32,
    /// Заставляет все операции падать, как при потере соединения
    broken: bool,
    /// find_* ничего не находят, вставки по-прежнему проверяют уникальность:
    /// так выглядит проигранная гонка между проверкой и вставкой
    stale_lookups: bool,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.broken {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    tables: Mutex<Tables>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn break_connection(&self) {
        self.tables.lock().unwrap().broken = true;
    }

    pub fn hide_existing_rows_from_lookups(&self) {
        self.tables.lock().unwrap().stale_lookups = true;
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().unwrap().sessions.len()
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        Ok(t.users.iter().find(|u| u.username == username).filter(|_| !t.stale_lookups).cloned())
    }

    async fn insert_user(&self, username: &str, password_hash: &str, role: Role) -> Result<i32, StoreError> {
        let mut t = self.tables.lock().unwrap();
        t.check()?;
        if t.users.iter().any(|u| u.username == username) {
            return Err(StoreError::Conflict("user"));
        }
        let id = t.next_id();
        t.users.push(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role: role.as_str().to_string(),
        });
        Ok(id)
    }

    async fn list_halls_ordered(&self) -> Result<Vec<Hall>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        let mut halls = t.halls.clone();
        halls.sort_by_key(|h| h.id);
        Ok(halls)
    }

    async fn find_hall_by_name(&self, name: &str) -> Result<Option<Hall>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        Ok(t.halls.iter().find(|h| h.name == name).filter(|_| !t.stale_lookups).cloned())
    }

    async fn insert_hall(&self, hall: &NewHall) -> Result<i32, StoreError> {
        let mut t = self.tables.lock().unwrap();
        t.check()?;
        if t.halls.iter().any(|h| h.name == hall.name) {
            return Err(StoreError::Conflict("hall"));
        }
        let id = t.next_id();
        t.halls.push(Hall {
            id,
            name: hall.name.clone(),
            rows: hall.rows,
            seats_per_row: hall.seats_per_row,
        });
        Ok(id)
    }

    async fn delete_hall(&self, hall_id: i32) -> Result<CascadeDelete, StoreError> {
        let mut t = self.tables.lock().unwrap();
        t.check()?;
        let before = t.sessions.len();
        t.sessions.retain(|s| s.hall_id != hall_id);
        let sessions_removed = (before - t.sessions.len()) as u64;
        let halls_before = t.halls.len();
        t.halls.retain(|h| h.id != hall_id);
        Ok(CascadeDelete { sessions_removed, parent_removed: t.halls.len() < halls_before })
    }

    async fn list_movies_ordered(&self) -> Result<Vec<Movie>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        let mut movies = t.movies.clone();
        movies.sort_by_key(|m| m.id);
        Ok(movies)
    }

    async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        Ok(t.movies.iter().find(|m| m.title == title).filter(|_| !t.stale_lookups).cloned())
    }

    async fn get_movie(&self, movie_id: i32) -> Result<Option<Movie>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        Ok(t.movies.iter().find(|m| m.id == movie_id).cloned())
    }

    async fn insert_movie(&self, movie: &NewMovie) -> Result<i32, StoreError> {
        let mut t = self.tables.lock().unwrap();
        t.check()?;
        if t.movies.iter().any(|m| m.title == movie.title) {
            return Err(StoreError::Conflict("movie"));
        }
        let id = t.next_id();
        t.movies.push(Movie {
            id,
            title: movie.title.clone(),
            genre: movie.genre.clone(),
            description: movie.description.clone(),
            duration: movie.duration,
            poster: movie.poster.clone(),
        });
        Ok(id)
    }

    async fn delete_movie(&self, movie_id: i32) -> Result<CascadeDelete, StoreError> {
        let mut t = self.tables.lock().unwrap();
        t.check()?;
        let before = t.sessions.len();
        t.sessions.retain(|s| s.movie_id != movie_id);
        let sessions_removed = (before - t.sessions.len()) as u64;
        let movies_before = t.movies.len();
        t.movies.retain(|m| m.id != movie_id);
        Ok(CascadeDelete { sessions_removed, parent_removed: t.movies.len() < movies_before })
    }

    async fn get_movie_poster(&self, movie_id: i32) -> Result<Option<String>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        Ok(t.movies.iter().find(|m| m.id == movie_id).and_then(|m| m.poster.clone()))
    }

    async fn list_poster_filenames(&self) -> Result<Vec<String>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        Ok(t.movies.iter().filter_map(|m| m.poster.clone()).collect())
    }

    async fn list_sessions_joined(&self) -> Result<Vec<ShowtimeListing>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        let mut rows: Vec<ShowtimeListing> = t
            .sessions
            .iter()
            .filter_map(|s| {
                let movie = t.movies.iter().find(|m| m.id == s.movie_id)?;
                let hall = t.halls.iter().find(|h| h.id == s.hall_id)?;
                Some(ShowtimeListing {
                    id: s.id,
                    movie_id: s.movie_id,
                    hall_id: s.hall_id,
                    movie_title: movie.title.clone(),
                    hall_name: hall.name.clone(),
                    datetime: s.datetime,
                    price: s.price,
                })
            })
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn find_session(
        &self,
        movie_id: i32,
        hall_id: i32,
        datetime: NaiveDateTime,
    ) -> Result<Option<Showtime>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        Ok(t
            .sessions
            .iter()
            .find(|s| s.movie_id == movie_id && s.hall_id == hall_id && s.datetime == datetime)
            .filter(|_| !t.stale_lookups)
            .cloned())
    }

    async fn insert_session(&self, session: &NewShowtime) -> Result<i32, StoreError> {
        let mut t = self.tables.lock().unwrap();
        t.check()?;
        if i64::from(session.price) > MAX_PRICE {
            return Err(StoreError::Rejected);
        }
        let movie_exists = t.movies.iter().any(|m| m.id == session.movie_id);
        let hall_exists = t.halls.iter().any(|h| h.id == session.hall_id);
        if !movie_exists || !hall_exists {
            return Err(StoreError::MissingReference);
        }
        let duplicate = t.sessions.iter().any(|s| {
            s.movie_id == session.movie_id && s.hall_id == session.hall_id && s.datetime == session.datetime
        });
        if duplicate {
            return Err(StoreError::Conflict("session"));
        }
        let id = t.next_id();
        t.sessions.push(Showtime {
            id,
            movie_id: session.movie_id,
            hall_id: session.hall_id,
            datetime: session.datetime,
            price: session.price,
        });
        Ok(id)
    }

    async fn delete_session(&self, session_id: i32) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().unwrap();
        t.check()?;
        let before = t.sessions.len();
        t.sessions.retain(|s| s.id != session_id);
        Ok(t.sessions.len() < before)
    }

    async fn list_sessions_for_hall(&self, hall_id: i32) -> Result<Vec<Showtime>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        Ok(t.sessions.iter().filter(|s| s.hall_id == hall_id).cloned().collect())
    }

    async fn list_sessions_for_movie(&self, movie_id: i32) -> Result<Vec<Showtime>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        Ok(t.sessions.iter().filter(|s| s.movie_id == movie_id).cloned().collect())
    }

    async fn list_movies_with_sessions(&self) -> Result<Vec<Movie>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        let mut movies: Vec<Movie> = t
            .movies
            .iter()
            .filter(|m| t.sessions.iter().any(|s| s.movie_id == m.id))
            .cloned()
            .collect();
        movies.sort_by_key(|m| m.id);
        Ok(movies)
    }

    async fn get_movie_with_sessions(
        &self,
        movie_id: i32,
    ) -> Result<Option<(Movie, Vec<MovieShowtime>)>, StoreError> {
        let t = self.tables.lock().unwrap();
        t.check()?;
        let Some(movie) = t.movies.iter().find(|m| m.id == movie_id).cloned() else {
            return Ok(None);
        };
        let mut sessions: Vec<MovieShowtime> = t
            .sessions
            .iter()
            .filter(|s| s.movie_id == movie_id)
            .filter_map(|s| {
                let hall = t.halls.iter().find(|h| h.id == s.hall_id)?;
                Some(MovieShowtime {
                    id: s.id,
                    hall_id: s.hall_id,
                    hall_name: hall.name.clone(),
                    datetime: s.datetime,
                    price: s.price,
                })
            })
            .collect();
        sessions.sort_by_key(|s| (s.datetime, s.id));
        Ok(Some((movie, sessions)))
    }
}
