//! ACCESO - Administrative account and access-control core
//!
//! Credential verification, brute-force lockout with lazy timed unlock,
//! password-history enforcement, signed session tokens and the audit
//! trail that backs an institutional admin panel.

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use auth::{
    authorize, hash_password, register, validate_password, verify_password, AdminSession,
    AuthService, Claims, CookiePolicy, CrudAction, FailureOutcome, Grant, LockoutStatus,
    ModuleGrant, PasswordError, RegistrationRequest, SameSite, Session, TokenIssuer,
    HISTORY_WINDOW, LOCKOUT_WINDOW_SECS, MAX_FAILED_ATTEMPTS, MIN_PASSWORD_LENGTH,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, Config, DatabaseConfig, LoggingConfig};
pub use db::{
    AuditSink, CredentialStore, Database, EventType, LoginAttempt, ModulePermission,
    NewLoginAttempt, NewPasswordChange, NewSystemEvent, NewUser, PasswordChange, Person, Severity,
    SqlAuditSink, SqlCredentialStore, SystemEvent, User, UserAccess,
};
pub use error::{AccesoError, Result};
