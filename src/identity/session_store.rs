//! Серверное хранилище веб-сессий.
//!
//! В cookie лежит только случайный идентификатор, сама запись (пользователь,
//! роль, flash-сообщения) хранится в Redis под ключом `session:<id>` с TTL.

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Identity;
use crate::models::Role;
use crate::redis_client::RedisClient;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("session record is corrupted: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Warning,
    Danger,
}

/// Одноразовое сообщение, показывается на следующей отрисованной странице
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { category: FlashCategory::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { category: FlashCategory::Warning, message: message.into() }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self { category: FlashCategory::Danger, message: message.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: Option<i32>,
    pub username: Option<String>,
    pub role: Option<Role>,
    #[serde(default)]
    pub flashes: Vec<Flash>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.username.is_none() && self.role.is_none() && self.flashes.is_empty()
    }

    pub fn identity(&self) -> Option<Identity> {
        Some(Identity {
            user_id: self.user_id?,
            username: self.username.clone()?,
            role: self.role?,
        })
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, sid: &str) -> Result<Option<SessionData>, SessionError>;
    async fn save(&self, sid: &str, data: &SessionData, ttl_seconds: u64) -> Result<(), SessionError>;
    async fn remove(&self, sid: &str) -> Result<(), SessionError>;
}

#[derive(Clone)]
pub struct RedisSessionStore {
    redis: RedisClient,
}

impl RedisSessionStore {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    fn key(sid: &str) -> String {
        format!("session:{}", sid)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, sid: &str) -> Result<Option<SessionData>, SessionError> {
        let mut conn = self.redis.conn.clone();
        let raw: Option<String> = conn.get(Self::key(sid)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, sid: &str, data: &SessionData, ttl_seconds: u64) -> Result<(), SessionError> {
        let json = serde_json::to_string(data)?;
        let mut conn = self.redis.conn.clone();
        let _: () = conn.set_ex(Self::key(sid), json, ttl_seconds).await?;
        Ok(())
    }

    async fn remove(&self, sid: &str) -> Result<(), SessionError> {
        let mut conn = self.redis.conn.clone();
        let _: () = conn.del(Self::key(sid)).await?;
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemorySessionStore;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_requires_all_fields() {
        let mut data = SessionData {
            user_id: Some(7),
            username: Some("alice".into()),
            role: None,
            flashes: vec![],
        };
        assert!(data.identity().is_none());
        data.role = Some(Role::User);
        let identity = data.identity().unwrap();
        assert_eq!(identity.user_id, 7);
        assert_eq!(identity.username, "alice");
    }

    #[test]
    fn record_serializes_role_in_lowercase() {
        let data = SessionData {
            user_id: Some(1),
            username: Some("admin".into()),
            role: Some(Role::Admin),
            flashes: vec![Flash::success("Hall added successfully!")],
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["flashes"][0]["category"], "success");

        let back: SessionData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn record_without_flashes_field_still_loads() {
        let back: SessionData =
            serde_json::from_str(r#"{"user_id":3,"username":"bob","role":"user"}"#).unwrap();
        assert!(back.flashes.is_empty());
        assert!(!back.is_empty());
    }
}
