//! Регистрация, вход и проверка ролей.

pub mod password;
pub mod session_store;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use validator::Validate;

use crate::middleware::WebSession;
use crate::models::Role;
use crate::store::{CatalogStore, StoreError};
use crate::AppState;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Username already exists!")]
    UsernameTaken,
    #[error("Invalid username or password!")]
    InvalidCredentials,
    #[error("Username and password are required!")]
    InvalidInput(#[from] validator::ValidationErrors),
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password worker failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Аутентифицированный пользователь текущей сессии
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[serde(default)]
    #[validate(length(min = 1, max = 80))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

pub struct IdentityService<'a> {
    catalog: &'a dyn CatalogStore,
    bcrypt_cost: u32,
}

impl<'a> IdentityService<'a> {
    pub fn new(catalog: &'a dyn CatalogStore, bcrypt_cost: u32) -> Self {
        Self { catalog, bcrypt_cost }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(state.catalog.as_ref(), state.config.session.bcrypt_cost)
    }

    /// Создает пользователя с ролью "user" и сразу входит под ним
    pub async fn register(
        &self,
        session: &mut WebSession,
        credentials: &Credentials,
    ) -> Result<Identity, IdentityError> {
        credentials.validate()?;
        let username = credentials.username.as_str();

        if self.catalog.find_user_by_username(username).await?.is_some() {
            return Err(IdentityError::UsernameTaken);
        }

        let digest = password::hash_password(&credentials.password, self.bcrypt_cost).await?;
        // уникальный индекс ловит гонку между проверкой и вставкой
        let user_id = match self.catalog.insert_user(username, &digest, Role::User).await {
            Ok(id) => id,
            Err(StoreError::Conflict(_)) => return Err(IdentityError::UsernameTaken),
            Err(e) => return Err(e.into()),
        };

        let identity = Identity { user_id, username: username.to_string(), role: Role::User };
        session.sign_in(&identity);
        info!("Registered user {} (id {})", identity.username, identity.user_id);
        Ok(identity)
    }

    pub async fn login(
        &self,
        session: &mut WebSession,
        credentials: &Credentials,
    ) -> Result<Identity, IdentityError> {
        let Some(user) = self.catalog.find_user_by_username(&credentials.username).await? else {
            return Err(IdentityError::InvalidCredentials);
        };

        if !password::verify_password(&credentials.password, &user.password_hash).await? {
            return Err(IdentityError::InvalidCredentials);
        }

        let identity = Identity { user_id: user.id, username: user.username.clone(), role: user.role() };
        session.sign_in(&identity);
        debug!("User {} logged in", identity.username);
        Ok(identity)
    }

    /// Создает администратора, если такого имени еще нет. true - если создан
    pub async fn seed_admin(&self, username: &str, plain_password: &str) -> Result<bool, IdentityError> {
        Credentials { username: username.to_string(), password: plain_password.to_string() }.validate()?;

        if self.catalog.find_user_by_username(username).await?.is_some() {
            return Ok(false);
        }
        let digest = password::hash_password(plain_password, self.bcrypt_cost).await?;
        match self.catalog.insert_user(username, &digest, Role::Admin).await {
            Ok(_) => Ok(true),
            Err(StoreError::Conflict(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn logout(session: &mut WebSession) {
    session.clear();
}

pub fn current_identity(session: &WebSession) -> Option<Identity> {
    session.identity()
}

/// None означает, что вызывающий должен отправить редирект на публичную страницу
pub fn require_role(session: &WebSession, role: Role) -> Option<Identity> {
    session.identity().filter(|identity| identity.role == role)
}
