use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue},
    response::Response,
};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::identity::session_store::{Flash, SessionData};
use crate::identity::Identity;
use crate::AppState;

/// Веб-сессия текущего запроса.
///
/// Загружается экстрактором один раз на запрос и явно передается в
/// обработчики; изменения сохраняются в [`WebSession::finish`].
#[derive(Debug, Default)]
pub struct WebSession {
    sid: Option<String>,
    data: SessionData,
    dirty: bool,
    rotate: bool,
}

impl WebSession {
    /// Сессия без cookie
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.data.identity()
    }

    pub fn sign_in(&mut self, identity: &Identity) {
        self.data.user_id = Some(identity.user_id);
        self.data.username = Some(identity.username.clone());
        self.data.role = Some(identity.role);
        self.dirty = true;
        // новый идентификатор после входа
        self.rotate = true;
    }

    pub fn clear(&mut self) {
        self.data = SessionData::default();
        self.dirty = true;
    }

    pub fn flash(&mut self, flash: Flash) {
        self.data.flashes.push(flash);
        self.dirty = true;
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        if self.data.flashes.is_empty() {
            return Vec::new();
        }
        self.dirty = true;
        std::mem::take(&mut self.data.flashes)
    }

    /// Сохраняет изменения сессии и выставляет/сбрасывает cookie в ответе
    pub async fn finish(self, state: &AppState, mut response: Response) -> Response {
        if !self.dirty {
            return response;
        }
        let cfg = &state.config.session;

        if let Some(old) = &self.sid {
            if self.rotate || self.data.is_empty() {
                if let Err(e) = state.sessions.remove(old).await {
                    warn!("failed to drop session record: {:?}", e);
                }
            }
        }

        if self.data.is_empty() {
            if self.sid.is_some() {
                set_cookie(&mut response, format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", cfg.cookie_name));
            }
            return response;
        }

        let sid = match (&self.sid, self.rotate) {
            (Some(existing), false) => existing.clone(),
            _ => Uuid::new_v4().to_string(),
        };

        if let Err(e) = state.sessions.save(&sid, &self.data, cfg.ttl_seconds).await {
            error!("failed to save session record: {:?}", e);
            return response;
        }

        if self.sid.as_deref() != Some(sid.as_str()) {
            set_cookie(
                &mut response,
                format!(
                    "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
                    cfg.cookie_name, sid, cfg.ttl_seconds
                ),
            );
        }
        response
    }
}

fn set_cookie(response: &mut Response, cookie: String) {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => error!("invalid session cookie header: {}", e),
    }
}

// Ищем значение cookie с нужным именем в заголовках Cookie
fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

// Session cookie extractor
impl FromRequestParts<Arc<AppState>> for WebSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(sid) = cookie_value(parts, &state.config.session.cookie_name) else {
            return Ok(WebSession::anonymous());
        };

        // Недоступное хранилище сессий = анонимный запрос, а не ошибка
        match state.sessions.load(&sid).await {
            Ok(Some(data)) => Ok(WebSession { sid: Some(sid), data, dirty: false, rotate: false }),
            Ok(None) => Ok(WebSession::anonymous()),
            Err(e) => {
                warn!("failed to load session {}: {:?}", sid, e);
                Ok(WebSession::anonymous())
            }
        }
    }
}
