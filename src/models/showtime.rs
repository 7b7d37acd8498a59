use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Верхняя граница цены сеанса (включительно)
pub const MAX_PRICE: i64 = 9999;

// Сеанс показа: строка таблицы sessions
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Showtime {
    pub id: i32,
    pub movie_id: i32,
    pub hall_id: i32,
    pub datetime: NaiveDateTime,
    pub price: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewShowtime {
    pub movie_id: i32,
    pub hall_id: i32,
    pub datetime: NaiveDateTime,
    pub price: i32,
}

// Строка админской таблицы сеансов
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ShowtimeListing {
    pub id: i32,
    pub movie_id: i32,
    pub hall_id: i32,
    pub movie_title: String,
    pub hall_name: String,
    pub datetime: NaiveDateTime,
    pub price: i32,
}

// Сеанс конкретного фильма на публичной странице
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct MovieShowtime {
    pub id: i32,
    pub hall_id: i32,
    pub hall_name: String,
    pub datetime: NaiveDateTime,
    pub price: i32,
}
