use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub uploads: UploadConfig,
    pub admin_seed: AdminSeedConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis (хранилище веб-сессий)
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Cookie сессии и стоимость хеширования паролей
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_seconds: u64,
    pub bcrypt_cost: u32,
}

// Каталог постеров
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
    /// 0 отключает фоновую очистку
    pub sweep_interval_seconds: u64,
}

// Учетная запись администратора для create_admin
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeedConfig {
    pub username: String,
    pub password: Option<String>,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: &str, expected: &'static str) -> Result<T, ConfigError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|_| ConfigError::Invalid { name, expected, value })
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(DatabaseConfig {
            url: required("DATABASE_URL")?,
            pool_size: parsed("DB_POOL_SIZE", "5", "number")?,
        })
    }
}

impl AdminSeedConfig {
    pub fn from_env() -> Self {
        AdminSeedConfig {
            username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            password: env::var("ADMIN_PASSWORD").ok(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parsed("PORT", "8000", "port number")?,
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "cinema_admin=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig {
                url: required("REDIS_URL")?,
            },
            session: SessionConfig {
                cookie_name: env::var("SESSION_COOKIE").unwrap_or_else(|_| "cinema_sid".to_string()),
                ttl_seconds: parsed("SESSION_TTL_SECONDS", "86400", "number of seconds")?,
                bcrypt_cost: parsed("BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string(), "bcrypt cost")?,
            },
            uploads: UploadConfig {
                dir: PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "static/uploads".to_string())),
                max_bytes: parsed("UPLOAD_MAX_BYTES", "10485760", "number of bytes")?,
                sweep_interval_seconds: parsed("POSTER_SWEEP_INTERVAL_SECONDS", "3600", "number of seconds")?,
            },
            admin_seed: AdminSeedConfig::from_env(),
        })
    }

    /// Конфигурация без окружения - для тестов роутера и сервисов
    #[cfg(test)]
    pub fn for_tests(upload_dir: PathBuf) -> Self {
        Config {
            app: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment: "test".to_string(),
                rust_log: "cinema_admin=debug".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/cinema_test".to_string(),
                pool_size: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost".to_string(),
            },
            session: SessionConfig {
                cookie_name: "cinema_sid".to_string(),
                ttl_seconds: 3600,
                bcrypt_cost: 4,
            },
            uploads: UploadConfig {
                dir: upload_dir,
                max_bytes: 1024 * 1024,
                sweep_interval_seconds: 0,
            },
            admin_seed: AdminSeedConfig {
                username: "admin".to_string(),
                password: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_falls_back_to_default() {
        let port: u16 = parsed("CINEMA_TEST_UNSET_PORT", "8000", "port number").unwrap();
        assert_eq!(port, 8000);
    }

    #[test]
    fn parsed_reports_variable_and_value() {
        env::set_var("CINEMA_TEST_BAD_PORT", "eighty");
        let err = parsed::<u16>("CINEMA_TEST_BAD_PORT", "8000", "port number").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("CINEMA_TEST_BAD_PORT"));
        assert!(message.contains("eighty"));
    }

    #[test]
    fn missing_required_variable() {
        let err = required("CINEMA_TEST_NEVER_SET").unwrap_err();
        assert_eq!(err.to_string(), "CINEMA_TEST_NEVER_SET must be set");
    }
}
