use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Placeholder secret used outside production when `JWT_SECRET` is unset.
pub const DEVELOPMENT_JWT_SECRET: &str = "farmbazaar-development-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub uploads: UploadConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_secs: u64,
    pub cookie_expiry_days: u64,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    /// Path prefix stored on listings and served by the static route.
    pub public_prefix: String,
    pub max_file_size: usize,
    pub max_images: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub max_history: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set in production")]
    MissingJwtSecret,

    #[error("invalid duration '{0}' (expected e.g. 90d, 12h, 30m, 45s)")]
    InvalidDuration(String),
}

const DAY_SECS: u64 = 24 * 60 * 60;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")).as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Rejects configurations that must never reach a running server.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment == Environment::Production
            && (self.security.jwt_secret.is_empty()
                || self.security.jwt_secret == DEVELOPMENT_JWT_SECRET)
        {
            return Err(ConfigError::MissingJwtSecret);
        }
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL").or_else(|_| env::var("DATABASE")) {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.api.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRES_IN") {
            match parse_duration_secs(&v) {
                Ok(secs) => self.security.jwt_expiry_secs = secs,
                Err(e) => tracing::warn!("ignoring JWT_EXPIRES_IN: {}", e),
            }
        }
        if let Ok(v) = env::var("JWT_COOKIE_EXPIRES_IN") {
            self.security.cookie_expiry_days = v.parse().unwrap_or(self.security.cookie_expiry_days);
        }
        if let Ok(v) = env::var("SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }

        // Upload overrides
        if let Ok(v) = env::var("UPLOAD_DIR") {
            self.uploads.dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("UPLOAD_MAX_FILE_SIZE") {
            self.uploads.max_file_size = v.parse().unwrap_or(self.uploads.max_file_size);
        }

        // Chat overrides
        if let Ok(v) = env::var("GEMINI_API_KEY") {
            self.chat.api_key = Some(v).filter(|k| !k.trim().is_empty());
        }
        if let Ok(v) = env::var("GEMINI_MODEL") {
            self.chat.model = v;
        }
        if let Ok(v) = env::var("GEMINI_ENDPOINT") {
            self.chat.endpoint = v;
        }
        if let Ok(v) = env::var("CHAT_MAX_HISTORY") {
            self.chat.max_history = v.parse().unwrap_or(self.chat.max_history);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: "postgres://localhost:5432/farmbazaar".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 3000,
                max_request_size_bytes: 40 * 1024 * 1024, // 7 files at 5MB plus form fields
                cors_origins: vec!["http://localhost:5173".to_string()],
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_expiry_secs: 90 * DAY_SECS,
                cookie_expiry_days: 90,
                secure_cookies: false,
            },
            uploads: UploadConfig::default(),
            chat: ChatConfig::default(),
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.api.cors_origins = vec!["https://staging.farmbazaar.in".to_string()];
        config.security.secure_cookies = true;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.api.cors_origins = vec!["https://farmbazaar.in".to_string()];
        config.security.jwt_secret = String::new();
        config.security.secure_cookies = true;
        config
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            public_prefix: "uploads".to_string(),
            max_file_size: 5 * 1024 * 1024,
            max_images: 5,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            max_history: 40,
            timeout_secs: 30,
        }
    }
}

/// Parses `90d`, `12h`, `30m`, `45s` or a bare number of seconds.
pub fn parse_duration_secs(value: &str) -> Result<u64, ConfigError> {
    let trimmed = value.trim();
    let invalid = || ConfigError::InvalidDuration(value.to_string());

    let (digits, multiplier) = match trimmed.char_indices().last() {
        Some((idx, 'd')) => (&trimmed[..idx], DAY_SECS),
        Some((idx, 'h')) => (&trimmed[..idx], 60 * 60),
        Some((idx, 'm')) => (&trimmed[..idx], 60),
        Some((idx, 's')) => (&trimmed[..idx], 1),
        Some(_) => (trimmed, 1),
        None => return Err(invalid()),
    };

    let amount: u64 = digits.trim().parse().map_err(|_| invalid())?;
    amount.checked_mul(multiplier).filter(|secs| *secs > 0).ok_or_else(invalid)
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
