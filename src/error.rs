//! Error types for ACCESO.

use thiserror::Error;

use crate::auth::PasswordError;

/// Common error type for ACCESO operations.
#[derive(Error, Debug)]
pub enum AccesoError {
    /// Unknown user or wrong password. Intentionally indistinguishable so
    /// callers cannot probe which usernames exist.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Account is locked; carries the seconds remaining until the lazy
    /// unlock window opens.
    #[error("account locked for {0} seconds")]
    AccountLocked(u64),

    /// This attempt crossed the failed-attempt threshold and locked the
    /// account.
    #[error("account locked after too many failed attempts")]
    AccountLockedNow,

    /// Role mismatch on the admin path, or a permission denial.
    #[error("not authorized")]
    NotAuthorized,

    /// New password shorter than the minimum length.
    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),

    /// New password matches one of the recently used passwords.
    #[error("password matches one of the last {0} passwords")]
    PasswordReused(usize),

    /// Input failed validation (registration fields and the like).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Database error.
    ///
    /// Wraps errors from any backing store; sqlx errors convert
    /// automatically.
    #[error("database error: {0}")]
    Database(String),

    /// Token signing or verification error.
    #[error("token error: {0}")]
    Token(String),

    /// Password hashing error (not a verification mismatch).
    #[error("hash error: {0}")]
    Hash(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for AccesoError {
    fn from(e: sqlx::Error) -> Self {
        AccesoError::Database(e.to_string())
    }
}

impl From<PasswordError> for AccesoError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::TooShort(min) => AccesoError::PasswordTooShort(min),
            PasswordError::VerificationFailed => AccesoError::InvalidCredentials,
            other => AccesoError::Hash(other.to_string()),
        }
    }
}

/// Result type alias for ACCESO operations.
pub type Result<T> = std::result::Result<T, AccesoError>;
