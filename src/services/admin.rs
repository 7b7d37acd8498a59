//! admin.rs
//!
//! Мутации админ-панели: залы, фильмы и сеансы.
//!
//! Каждое действие - один цикл запрос/ответ:
//! - проверка входных данных и дубликатов (дружелюбное сообщение);
//! - запись в каталог (уникальность гарантирует сама БД);
//! - каскадное удаление сеансов вместе с залом или фильмом;
//! - сохранение и удаление файла постера.
//!
//! Ошибки хранилища не выходят наружу: они логируются и превращаются во
//! flash-сообщение.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::identity::session_store::Flash;
use crate::models::{NewHall, NewMovie, NewShowtime, MAX_PRICE};
use crate::services::posters::PosterStorage;
use crate::store::{CatalogStore, StoreError};

pub const DATABASE_ERROR: &str = "Database error, please try again later.";
pub const PRICE_TOO_HIGH: &str = "Price cannot exceed 9999!";
pub const POSTER_NOT_ALLOWED: &str = "Poster must be a png, jpg, jpeg or gif image!";

const DATETIME_FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Error)]
pub enum FormError {
    #[error("missing field {0}")]
    Missing(&'static str),
    #[error("{0} must be a whole number")]
    NotANumber(&'static str),
    #[error("datetime must look like 2024-01-01T18:00")]
    BadDatetime,
    #[error("{0}")]
    Invalid(#[from] validator::ValidationErrors),
    #[error("no admin action in form")]
    UnknownAction,
}

/// Загруженный файл постера
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Поля формы админ-панели после разбора тела запроса
#[derive(Debug, Default)]
pub struct AdminForm {
    pub fields: HashMap<String, String>,
    pub poster: Option<Upload>,
}

#[derive(Debug)]
pub enum AdminAction {
    AddHall(NewHall),
    DeleteHall { hall_id: i32 },
    AddMovie { movie: NewMovie, poster: Option<Upload> },
    DeleteMovie { movie_id: i32 },
    AddSession { movie_id: i32, hall_id: i32, datetime: NaiveDateTime, price: i64 },
    DeleteSession { session_id: i32 },
}

fn text<'f>(fields: &'f HashMap<String, String>, name: &'static str) -> Result<&'f str, FormError> {
    fields.get(name).map(|v| v.trim()).ok_or(FormError::Missing(name))
}

fn number<T: FromStr>(fields: &HashMap<String, String>, name: &'static str) -> Result<T, FormError> {
    text(fields, name)?.parse().map_err(|_| FormError::NotANumber(name))
}

pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, FormError> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
        .ok_or(FormError::BadDatetime)
}

impl AdminAction {
    /// Действие определяется по наличию поля-маркера (add_hall, delete_hall, ...)
    pub fn from_form(form: AdminForm) -> Result<Self, FormError> {
        let AdminForm { fields, poster } = form;
        let has = |marker: &str| fields.contains_key(marker);

        if has("add_hall") {
            let hall = NewHall {
                name: text(&fields, "name")?.to_string(),
                rows: number(&fields, "rows")?,
                seats_per_row: number(&fields, "seats_per_row")?,
            };
            hall.validate()?;
            Ok(AdminAction::AddHall(hall))
        } else if has("delete_hall") {
            Ok(AdminAction::DeleteHall { hall_id: number(&fields, "hall_id")? })
        } else if has("add_movie") {
            let genre = fields
                .get("genre")
                .map(|g| g.trim())
                .filter(|g| !g.is_empty())
                .map(str::to_string);
            let movie = NewMovie {
                title: text(&fields, "title")?.to_string(),
                genre,
                description: fields.get("description").map(|d| d.trim().to_string()).unwrap_or_default(),
                duration: number(&fields, "duration")?,
                poster: None,
            };
            movie.validate()?;
            Ok(AdminAction::AddMovie { movie, poster })
        } else if has("delete_movie") {
            Ok(AdminAction::DeleteMovie { movie_id: number(&fields, "movie_id")? })
        } else if has("add_session") {
            Ok(AdminAction::AddSession {
                movie_id: number(&fields, "movie_id")?,
                hall_id: number(&fields, "hall_id")?,
                datetime: parse_datetime(text(&fields, "datetime")?)?,
                price: number(&fields, "price")?,
            })
        } else if has("delete_session") {
            Ok(AdminAction::DeleteSession { session_id: number(&fields, "session_id")? })
        } else {
            Err(FormError::UnknownAction)
        }
    }
}

fn removed_message(entity: &str, sessions_removed: u64) -> String {
    if sessions_removed > 0 {
        format!("{} and {} linked session(s) deleted successfully!", entity, sessions_removed)
    } else {
        format!("{} deleted successfully!", entity)
    }
}

/// Сравнивает найденные заранее сеансы с фактически удаленными в транзакции.
/// Расхождение значит, что сеансы менялись параллельно; в сообщении
/// пользователю всегда фактическое число.
fn log_cascade_drift(entity: &str, id: i32, linked: usize, removed: u64) -> bool {
    if linked as u64 == removed {
        debug!("{} {} cascaded to {} sessions", entity, id, removed);
        false
    } else {
        warn!("{} {}: expected {} linked sessions, transaction removed {}", entity, id, linked, removed);
        true
    }
}

pub struct AdminWorkflow<'a> {
    catalog: &'a dyn CatalogStore,
    posters: &'a PosterStorage,
}

impl<'a> AdminWorkflow<'a> {
    pub fn new(catalog: &'a dyn CatalogStore, posters: &'a PosterStorage) -> Self {
        Self { catalog, posters }
    }

    /// Выполняет действие и возвращает сообщение для пользователя
    pub async fn apply(&self, action: AdminAction) -> Flash {
        let result = match action {
            AdminAction::AddHall(hall) => self.add_hall(hall).await,
            AdminAction::DeleteHall { hall_id } => self.delete_hall(hall_id).await,
            AdminAction::AddMovie { movie, poster } => self.add_movie(movie, poster).await,
            AdminAction::DeleteMovie { movie_id } => self.delete_movie(movie_id).await,
            AdminAction::AddSession { movie_id, hall_id, datetime, price } => {
                self.add_session(movie_id, hall_id, datetime, price).await
            }
            AdminAction::DeleteSession { session_id } => self.delete_session(session_id).await,
        };

        result.unwrap_or_else(|e| {
            error!("admin action failed: {:?}", e);
            Flash::danger(DATABASE_ERROR)
        })
    }

    /* ---------- HALLS ---------- */

    async fn add_hall(&self, hall: NewHall) -> Result<Flash, StoreError> {
        if self.catalog.find_hall_by_name(&hall.name).await?.is_some() {
            return Ok(Flash::warning("Hall already exists!"));
        }

        match self.catalog.insert_hall(&hall).await {
            Ok(id) => {
                info!("Hall {:?} added (id {})", hall.name, id);
                Ok(Flash::success("Hall added successfully!"))
            }
            Err(StoreError::Conflict(_)) => Ok(Flash::warning("Hall already exists!")),
            Err(e) => Err(e),
        }
    }

    async fn delete_hall(&self, hall_id: i32) -> Result<Flash, StoreError> {
        let linked = self.catalog.list_sessions_for_hall(hall_id).await?;

        let result = self.catalog.delete_hall(hall_id).await?;
        if !result.parent_removed {
            return Ok(Flash::warning("Hall not found!"));
        }
        log_cascade_drift("hall", hall_id, linked.len(), result.sessions_removed);

        info!("Hall {} deleted with {} sessions", hall_id, result.sessions_removed);
        Ok(Flash::success(removed_message("Hall", result.sessions_removed)))
    }

    /* ---------- MOVIES ---------- */

    async fn add_movie(&self, mut movie: NewMovie, poster: Option<Upload>) -> Result<Flash, StoreError> {
        if self.catalog.find_movie_by_title(&movie.title).await?.is_some() {
            return Ok(Flash::warning("Movie already exists!"));
        }

        // Файл пишется до строки в БД; если вставка затем упадет,
        // осиротевший файл уберет очистка постеров.
        if let Some(upload) = poster {
            let name = match PosterStorage::stored_name(&upload.filename) {
                Some(name) if PosterStorage::is_allowed(&upload.filename) && PosterStorage::is_allowed(&name) => name,
                _ => return Ok(Flash::danger(POSTER_NOT_ALLOWED)),
            };
            if let Err(e) = self.posters.save(&name, &upload.bytes).await {
                error!("failed to save poster {}: {:?}", name, e);
                return Ok(Flash::danger("Failed to save poster file!"));
            }
            movie.poster = Some(name);
        }

        match self.catalog.insert_movie(&movie).await {
            Ok(id) => {
                info!("Movie {:?} added (id {})", movie.title, id);
                Ok(Flash::success("Movie added successfully!"))
            }
            Err(StoreError::Conflict(_)) => {
                warn!("movie {:?} inserted concurrently, poster {:?} left for cleanup", movie.title, movie.poster);
                Ok(Flash::warning("Movie already exists!"))
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_movie(&self, movie_id: i32) -> Result<Flash, StoreError> {
        let linked = self.catalog.list_sessions_for_movie(movie_id).await?;
        let poster = self.catalog.get_movie_poster(movie_id).await?;

        let result = self.catalog.delete_movie(movie_id).await?;
        if !result.parent_removed {
            return Ok(Flash::warning("Movie not found!"));
        }
        log_cascade_drift("movie", movie_id, linked.len(), result.sessions_removed);

        // Отсутствующий файл молча пропускаем
        if let Some(name) = poster {
            match self.posters.delete(&name).await {
                Ok(true) => debug!("poster {} removed", name),
                Ok(false) => {}
                Err(e) => warn!("failed to remove poster {}: {:?}", name, e),
            }
        }

        info!("Movie {} deleted with {} sessions", movie_id, result.sessions_removed);
        Ok(Flash::success(removed_message("Movie", result.sessions_removed)))
    }

    /* ---------- SESSIONS ---------- */

    async fn add_session(
        &self,
        movie_id: i32,
        hall_id: i32,
        datetime: NaiveDateTime,
        price: i64,
    ) -> Result<Flash, StoreError> {
        if price > MAX_PRICE {
            return Ok(Flash::danger(PRICE_TOO_HIGH));
        }
        let Ok(price) = i32::try_from(price) else {
            return Ok(Flash::danger("Invalid price!"));
        };

        if self.catalog.find_session(movie_id, hall_id, datetime).await?.is_some() {
            return Ok(Flash::warning("Session already exists!"));
        }

        let session = NewShowtime { movie_id, hall_id, datetime, price };
        match self.catalog.insert_session(&session).await {
            Ok(id) => {
                info!("Session {} added: movie {} hall {} at {}", id, movie_id, hall_id, datetime);
                Ok(Flash::success("Session added successfully!"))
            }
            Err(StoreError::Conflict(_)) => Ok(Flash::warning("Session already exists!")),
            Err(StoreError::MissingReference) => Ok(Flash::danger("Selected movie or hall does not exist!")),
            Err(StoreError::Rejected) => Ok(Flash::danger(PRICE_TOO_HIGH)),
            Err(e) => Err(e),
        }
    }

    async fn delete_session(&self, session_id: i32) -> Result<Flash, StoreError> {
        let removed = self.catalog.delete_session(session_id).await?;
        debug!("delete_session {}: removed={}", session_id, removed);
        Ok(Flash::success("Session deleted successfully!"))
    }
}
