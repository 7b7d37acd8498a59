use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub genre: Option<String>,
    pub description: String,
    /// Длительность в минутах
    pub duration: i32,
    /// Имя файла в каталоге постеров
    pub poster: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct NewMovie {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 100))]
    pub genre: Option<String>,
    pub description: String,
    /// Не больше суток
    #[validate(range(min = 1, max = 1440))]
    pub duration: i32,
    pub poster: Option<String>,
}
