//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub log_level: Level,
    /// Prefix of the confirmation links written into emails.
    pub public_base_url: String,
    pub email_dir: PathBuf,
    pub session_ttl_hours: i64,
    pub cors_origin: String,
    /// Debug affordance: echo the confirmation link in the register response.
    pub expose_confirmation_link: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            public_base_url: "http://localhost:3000".to_string(),
            email_dir: PathBuf::from("./var/emails"),
            session_ttl_hours: 24 * 30,
            cors_origin: "http://localhost:5173".to_string(),
            expose_confirmation_link: false,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        let defaults = Self::default();

        // --- Load Server and Database Settings ---
        let bind_address = match std::env::var("BIND_ADDRESS") {
            Ok(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            Err(_) => defaults.bind_address,
        };

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Account and Session Settings ---
        let public_base_url =
            std::env::var("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url);
        if !public_base_url.starts_with("http://") && !public_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "PUBLIC_BASE_URL".to_string(),
                format!("'{}' must be an http(s) URL", public_base_url),
            ));
        }

        let email_dir = std::env::var("EMAIL_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.email_dir);

        let session_ttl_hours = match std::env::var("SESSION_TTL_HOURS") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "SESSION_TTL_HOURS".to_string(),
                        format!("'{}' is not a positive number of hours", raw),
                    ))
                }
            },
            Err(_) => defaults.session_ttl_hours,
        };

        let cors_origin = std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        let expose_confirmation_link = match std::env::var("EXPOSE_CONFIRMATION_LINK") {
            Ok(raw) => raw.parse::<bool>().map_err(|_| {
                ConfigError::InvalidValue(
                    "EXPOSE_CONFIRMATION_LINK".to_string(),
                    format!("'{}' is not true or false", raw),
                )
            })?,
            Err(_) => defaults.expose_confirmation_link,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            public_base_url,
            email_dir,
            session_ttl_hours,
            cors_origin,
            expose_confirmation_link,
        })
    }
}
