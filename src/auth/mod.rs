//! Authentication module for ACCESO.
//!
//! Password hashing, the lockout and password-history policies, session
//! tokens, permission checks, registration and the service that ties
//! them together.

mod authorize;
mod history;
mod lockout;
mod password;
mod registration;
mod service;
mod token;

pub use authorize::{authorize, CrudAction};
pub use history::{accepts, HISTORY_WINDOW};
pub use lockout::{
    check_expiry, register_failure, FailureOutcome, LockoutStatus, LOCKOUT_WINDOW_SECS,
    MAX_FAILED_ATTEMPTS,
};
pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
pub use registration::{register, RegistrationRequest};
pub use service::{AdminSession, AuthService, Session};
pub use token::{Claims, CookiePolicy, Grant, ModuleGrant, SameSite, TokenIssuer};
