use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Hall {
    pub id: i32,
    pub name: String,
    pub rows: i32,
    pub seats_per_row: i32,
}

/// Размеры зала ограничены 1..=1000 рядов и мест в ряду
#[derive(Debug, Clone, Validate)]
pub struct NewHall {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 1, max = 1000))]
    pub rows: i32,
    #[validate(range(min = 1, max = 1000))]
    pub seats_per_row: i32,
}
