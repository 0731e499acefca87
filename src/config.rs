//! Application configuration
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database connection URL
    pub database_url: String,
    /// Maximum pooled database connections
    pub database_max_connections: u32,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
    /// Environment (development/production)
    pub environment: Environment,
    /// Name of the cookie carrying the portal session token
    pub session_cookie: String,
    /// Upper bound on a single notification delivery
    pub notification_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = match var("ENVIRONMENT")
            .unwrap_or_else(|| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };

        // DATABASE_URL, then DATABASE_SERVER_FULL, then individual components
        let database_url = var("DATABASE_URL")
            .or_else(|| var("DATABASE_SERVER_FULL"))
            .or_else(|| {
                let host = var("DATABASE_SERVER_HOST")?;
                let port = var("DATABASE_SERVER_PORT").unwrap_or_else(|| "5432".to_string());
                let user = var("DATABASE_SERVER_USER")?;
                let password = var("DATABASE_PASSWORD")?;
                let db = var("DATABASE_DB")?;
                Some(format!(
                    "postgres://{}:{}@{}:{}/{}",
                    user, password, host, port, db
                ))
            })
            .ok_or_else(|| {
                ConfigError::Missing(
                    "DATABASE_URL, DATABASE_SERVER_FULL, or DATABASE_SERVER_HOST + DATABASE_SERVER_USER + DATABASE_PASSWORD + DATABASE_DB is required".to_string(),
                )
            })?;

        let port = match var("PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT must be a number, got '{}'", p)))?,
            None => 8080,
        };

        let notification_timeout_ms: u64 = var("NOTIFICATION_TIMEOUT_MS")
            .and_then(|t| t.parse().ok())
            .unwrap_or(2_000);

        Ok(Config {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url,
            database_max_connections: var("DATABASE_MAX_CONNECTIONS")
                .and_then(|c| c.parse().ok())
                .unwrap_or(10),
            max_body_size: var("MAX_BODY_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(64 * 1024), // 64KB default
            cors_origins: var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| vec!["http://localhost:8080".to_string()]),
            environment,
            session_cookie: var("SESSION_COOKIE").unwrap_or_else(|| "portal_session".to_string()),
            notification_timeout: Duration::from_millis(notification_timeout_ms),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
