//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::constants::{
    DEFAULT_EMAIL_FIELD, DEFAULT_EMAIL_FROM, DEFAULT_HANDLER_LIMIT, DEFAULT_NOTIFY_INITIAL_BACKOFF_MS,
    DEFAULT_NOTIFY_MAX_BACKOFF_MS, DEFAULT_PRIZES_PATH, DEFAULT_RACE_NAME, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT,
};

/// Global application configuration (lazily initialized)
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub race: RaceConfig,
    pub notify: NotifyConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    /// Concurrent request limit, 0 for "one less than the CPU count"
    pub handler_limit: usize,
}

/// Race identity and notification addressing
#[derive(Debug, Clone)]
pub struct RaceConfig {
    pub name: String,
    /// Optional-field column holding racer e-mail addresses
    pub email_field: String,
    pub email_from: String,
    /// Prize table loaded at startup, skipped when the file is absent
    pub prizes_path: PathBuf,
}

/// Notification retry tuning
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            race: RaceConfig::from_env(),
            notify: NotifyConfig::from_env()?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                rust_log: "info".to_string(),
                handler_limit: DEFAULT_HANDLER_LIMIT,
            },
            race: RaceConfig {
                name: DEFAULT_RACE_NAME.to_string(),
                email_field: DEFAULT_EMAIL_FIELD.to_string(),
                email_from: DEFAULT_EMAIL_FROM.to_string(),
                prizes_path: PathBuf::from(DEFAULT_PRIZES_PATH),
            },
            notify: NotifyConfig {
                initial_backoff_ms: DEFAULT_NOTIFY_INITIAL_BACKOFF_MS,
                max_backoff_ms: DEFAULT_NOTIFY_MAX_BACKOFF_MS,
            },
        }
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: parse_var("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            handler_limit: parse_var("HANDLER_LIMIT", DEFAULT_HANDLER_LIMIT)?,
        })
    }

    /// Number of requests served at once
    pub fn effective_handler_limit(&self) -> usize {
        resolve_handler_limit(self.handler_limit, num_cpus::get())
    }
}

impl RaceConfig {
    fn from_env() -> Self {
        Self {
            name: env::var("RACE_NAME").unwrap_or_else(|_| DEFAULT_RACE_NAME.to_string()),
            email_field: env::var("RACE_EMAIL_FIELD").unwrap_or_else(|_| DEFAULT_EMAIL_FIELD.to_string()),
            email_from: env::var("RACE_EMAIL_FROM").unwrap_or_else(|_| DEFAULT_EMAIL_FROM.to_string()),
            prizes_path: PathBuf::from(
                env::var("PRIZES_PATH").unwrap_or_else(|_| DEFAULT_PRIZES_PATH.to_string()),
            ),
        }
    }
}

impl NotifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            initial_backoff_ms: parse_var("NOTIFY_INITIAL_BACKOFF_MS", DEFAULT_NOTIFY_INITIAL_BACKOFF_MS)?,
            max_backoff_ms: parse_var("NOTIFY_MAX_BACKOFF_MS", DEFAULT_NOTIFY_MAX_BACKOFF_MS)?,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// An explicit limit wins; otherwise leave one core for the background tasks.
pub fn resolve_handler_limit(configured: usize, cpus: usize) -> usize {
    if configured > 0 {
        configured
    } else {
        cpus.saturating_sub(1).max(1)
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.race.email_field, "Email");
        assert_eq!(config.race.prizes_path, PathBuf::from("prizes.json"));
        assert_eq!(config.notify.initial_backoff_ms, 1_000);
    }

    #[test]
    fn test_resolve_handler_limit() {
        assert_eq!(resolve_handler_limit(4, 16), 4);
        assert_eq!(resolve_handler_limit(0, 8), 7);
        assert_eq!(resolve_handler_limit(0, 1), 1);
        assert_eq!(resolve_handler_limit(0, 0), 1);
    }

    #[test]
    fn test_parse_var_falls_back_to_default() {
        assert_eq!(parse_var("RACETRACK_TEST_UNSET_VARIABLE", 42u64).unwrap(), 42);
    }
}
