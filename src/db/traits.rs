//! Persistence trait definitions for ACCESO.
//!
//! The auth core never talks to a concrete store: it consumes these two
//! seams, which a backend implements (the bundled SQLite implementations
//! live in `store.rs` and `audit.rs`).

use crate::db::models::{
    LoginAttempt, NewLoginAttempt, NewPasswordChange, NewSystemEvent, NewUser, PasswordChange,
    User, UserAccess,
};
use crate::Result;

/// Repository over user, person, role and permission records.
#[allow(async_fn_in_trait)]
pub trait CredentialStore: Send + Sync {
    /// Find a user by username with role and permissions eagerly resolved.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccess>>;

    /// Find a user by ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Persist the blocked flag and failed-attempt counter.
    async fn update_lock_state(&self, id: i64, blocked: bool, failed_attempts: i64) -> Result<()>;

    /// Persist lock state only if the counter still holds the expected
    /// value. Returns false when a concurrent writer got there first.
    async fn update_lock_state_if(
        &self,
        id: i64,
        blocked: bool,
        failed_attempts: i64,
        expected_attempts: i64,
    ) -> Result<bool>;

    /// Replace the user's current password hash.
    async fn update_password(&self, id: i64, new_hash: &str) -> Result<()>;

    /// Create a new user. The password must already be hashed.
    async fn create_user(&self, new_user: &NewUser) -> Result<User>;

    /// Delete a user, cascading its permissions and role assignments
    /// first.
    async fn delete_user(&self, id: i64) -> Result<bool>;

    /// Check whether a username is already taken.
    async fn username_exists(&self, username: &str) -> Result<bool>;

    /// Check whether a person record exists.
    async fn person_exists(&self, person_id: i64) -> Result<bool>;
}

/// Append-only writer for the three audit streams, plus the read accessors
/// the policies need. No record is ever mutated after creation.
#[allow(async_fn_in_trait)]
pub trait AuditSink: Send + Sync {
    /// Append a login attempt record.
    async fn record_login_attempt(&self, record: &NewLoginAttempt) -> Result<()>;

    /// Append a system event record.
    async fn record_system_event(&self, record: &NewSystemEvent) -> Result<()>;

    /// Append a password change record.
    async fn record_password_change(&self, record: &NewPasswordChange) -> Result<()>;

    /// Most recent login attempt for a subject, by timestamp descending.
    async fn last_login_attempt(&self, subject: &str) -> Result<Option<LoginAttempt>>;

    /// The `n` most recent password change records for a subject, by
    /// change timestamp descending.
    async fn last_password_changes(&self, subject: &str, n: usize) -> Result<Vec<PasswordChange>>;
}
