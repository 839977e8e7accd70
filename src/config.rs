//! Configuration module for ACCESO.

use serde::Deserialize;
use std::path::Path;

use crate::{AccesoError, Result};

/// Authentication and account-protection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret for signing session tokens (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Failed attempts before an account is blocked.
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: i64,
    /// Seconds an account stays blocked after the last attempt.
    #[serde(default = "default_lockout_secs")]
    pub lockout_secs: i64,
    /// Session token lifetime in minutes.
    #[serde(default = "default_token_ttl_mins")]
    pub token_ttl_mins: i64,
    /// Cookie lifetime in seconds, enforced by the HTTP layer.
    /// Independent of the token lifetime; both apply.
    #[serde(default = "default_cookie_max_age_secs")]
    pub cookie_max_age_secs: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,
    /// How many previous password hashes are checked for reuse.
    #[serde(default = "default_password_history_window")]
    pub password_history_window: usize,
    /// Days until the next recommended password change (informational).
    #[serde(default = "default_password_next_change_days")]
    pub password_next_change_days: i64,
    /// Role name required by the admin login path.
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
    /// UTC offset in hours for audit timestamps.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

fn default_jwt_secret() -> String {
    "insecure-dev-secret".to_string()
}

fn default_max_failed_attempts() -> i64 {
    5
}

fn default_lockout_secs() -> i64 {
    20
}

fn default_token_ttl_mins() -> i64 {
    30
}

fn default_cookie_max_age_secs() -> u64 {
    2 * 60 * 60
}

fn default_password_min_length() -> usize {
    6
}

fn default_password_history_window() -> usize {
    2
}

fn default_password_next_change_days() -> i64 {
    90
}

fn default_admin_role() -> String {
    "Admin".to_string()
}

fn default_utc_offset_hours() -> i32 {
    -4
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            max_failed_attempts: default_max_failed_attempts(),
            lockout_secs: default_lockout_secs(),
            token_ttl_mins: default_token_ttl_mins(),
            cookie_max_age_secs: default_cookie_max_age_secs(),
            password_min_length: default_password_min_length(),
            password_history_window: default_password_history_window(),
            password_next_change_days: default_password_next_change_days(),
            admin_role: default_admin_role(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/acceso.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path; console-only when absent.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| AccesoError::Config(e.to_string()))
    }
}
