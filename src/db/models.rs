//! Data model for ACCESO.
//!
//! Identity records (users, people, role assignments, permissions) and the
//! three append-only audit streams. Timestamps are stored as RFC3339 text.

use std::fmt;

use chrono::{DateTime, FixedOffset};

/// User account.
///
/// # Invariants
/// - `failed_attempts` stays in `[0, 5]`.
/// - `blocked == true` implies the counter reached the threshold at the
///   time of blocking (automatic path) or was forced to it (manual path).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique).
    pub username: String,
    /// Password hash (Argon2 PHC string).
    pub password: String,
    /// Whether the account is blocked.
    pub blocked: bool,
    /// Consecutive failed login attempts.
    pub failed_attempts: i64,
    /// The person this account belongs to.
    pub person_id: i64,
    /// Account creation timestamp.
    pub created_at: String,
}

/// Person linked to a user account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Person {
    /// Unique person ID.
    pub id: i64,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email (optional).
    pub email: Option<String>,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Password hash (must be pre-hashed).
    pub password: String,
    /// Linked person ID.
    pub person_id: i64,
}

impl NewUser {
    /// Create a new user record. `password` must already be hashed.
    pub fn new(username: impl Into<String>, password: impl Into<String>, person_id: i64) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            person_id,
        }
    }
}

/// Per-module capabilities granted through a role assignment.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ModulePermission {
    /// Module name this entry applies to.
    pub module: String,
    pub can_create: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_read: bool,
    pub can_report: bool,
}

/// A user together with its resolved role and permission set.
///
/// A user has at most one consulted role assignment; when several rows
/// exist, the one with the lowest id wins.
#[derive(Debug, Clone)]
pub struct UserAccess {
    /// The user row.
    pub user: User,
    /// Assigned role name, if any.
    pub role_name: Option<String>,
    /// Permissions granted through the role assignment.
    pub permissions: Vec<ModulePermission>,
}

impl UserAccess {
    /// Role name for display and token claims; "Sin rol" when unassigned.
    pub fn role_display(&self) -> &str {
        self.role_name.as_deref().unwrap_or("Sin rol")
    }
}

/// Severity level of a system event. Labels are persisted in Spanish for
/// compatibility with the existing log data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// String stored in the `system_events` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "ADVERTENCIA",
            Severity::Error => "ERROR",
            Severity::Critical => "CRÍTICO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// System event types, persisted verbatim so existing log consumers keep
/// working.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    LoginSuccess,
    LoginFailed,
    UserBlocked,
    AutoUnblocked,
    ManualBlock,
    ManualUnblock,
    PasswordChanged,
}

impl EventType {
    /// String stored in the `system_events` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::LoginSuccess => "LOGIN_EXITOSO",
            EventType::LoginFailed => "LOGIN_FALLIDO",
            EventType::UserBlocked => "USUARIO_BLOQUEADO",
            EventType::AutoUnblocked => "DESBLOQUEO_AUTOMATICO",
            EventType::ManualBlock => "BLOQUEO_MANUAL",
            EventType::ManualUnblock => "DESBLOQUEO_MANUAL",
            EventType::PasswordChanged => "CAMBIO_CONTRASEÑA",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable record of one login attempt.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoginAttempt {
    /// Record ID.
    pub id: i64,
    /// Username the attempt was made against; None when unknown.
    pub subject: Option<String>,
    /// Client IP.
    pub ip: String,
    /// When the attempt happened (RFC3339).
    pub attempted_at: String,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Failure reason, or the reset reason on synthetic success records.
    pub reason: Option<String>,
    /// Attempt number; 0 on counter resets.
    pub attempt_number: i64,
}

impl LoginAttempt {
    /// Parsed attempt timestamp; None when the stored text is not RFC3339.
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.attempted_at).ok()
    }
}

/// Data for appending a login attempt record.
#[derive(Debug, Clone)]
pub struct NewLoginAttempt {
    pub subject: Option<String>,
    pub ip: String,
    pub at: DateTime<FixedOffset>,
    pub success: bool,
    pub reason: Option<String>,
    pub attempt_number: i64,
}

/// Immutable record of one password change.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordChange {
    /// Record ID.
    pub id: i64,
    /// Username of the account whose password changed.
    pub subject: String,
    /// Hash the password had before the change.
    pub previous_hash: String,
    /// When the change happened (RFC3339).
    pub changed_at: String,
    /// Informational next-allowed-change timestamp (change + 90 days).
    pub next_change_at: String,
    /// Why the change was recorded.
    pub reason: String,
}

/// Data for appending a password change record.
#[derive(Debug, Clone)]
pub struct NewPasswordChange {
    pub subject: String,
    pub previous_hash: String,
    pub changed_at: DateTime<FixedOffset>,
    pub next_change_at: DateTime<FixedOffset>,
    pub reason: String,
}

/// Immutable record of one system event.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SystemEvent {
    /// Record ID.
    pub id: i64,
    /// Username the event concerns; None for anonymous/system events.
    pub subject: Option<String>,
    /// Event type string (see [`EventType`]).
    pub event_type: String,
    /// Human-readable description.
    pub description: String,
    /// Client IP, "0.0.0.0" when not applicable.
    pub ip: String,
    /// Severity label (see [`Severity`]).
    pub severity: String,
    /// When the event happened (RFC3339).
    pub occurred_at: String,
}

/// Data for appending a system event record.
#[derive(Debug, Clone)]
pub struct NewSystemEvent {
    pub subject: Option<String>,
    pub event_type: EventType,
    pub description: String,
    pub ip: String,
    pub severity: Severity,
    pub at: DateTime<FixedOffset>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn test_event_type_strings() {
        assert_eq!(EventType::LoginSuccess.as_str(), "LOGIN_EXITOSO");
        assert_eq!(EventType::UserBlocked.as_str(), "USUARIO_BLOQUEADO");
        assert_eq!(EventType::AutoUnblocked.as_str(), "DESBLOQUEO_AUTOMATICO");
        assert_eq!(EventType::PasswordChanged.as_str(), "CAMBIO_CONTRASEÑA");
    }

    #[test]
    fn test_severity_strings() {
        assert_eq!(Severity::Warning.as_str(), "ADVERTENCIA");
        assert_eq!(Severity::Critical.as_str(), "CRÍTICO");
        assert_eq!(Severity::Info.to_string(), "INFO");
    }

    #[test]
    fn test_role_display_fallback() {
        let user = User {
            id: 1,
            username: "ana".to_string(),
            password: "hash".to_string(),
            blocked: false,
            failed_attempts: 0,
            person_id: 1,
            created_at: "2025-01-01 00:00:00".to_string(),
        };

        let access = UserAccess {
            user,
            role_name: None,
            permissions: Vec::new(),
        };
        assert_eq!(access.role_display(), "Sin rol");

        let access = UserAccess {
            role_name: Some("Admin".to_string()),
            ..access
        };
        assert_eq!(access.role_display(), "Admin");
    }

    #[test]
    fn test_login_attempt_timestamp_parse() {
        let offset = FixedOffset::west_opt(4 * 3600).unwrap();
        let at = offset.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();

        let attempt = LoginAttempt {
            id: 1,
            subject: Some("ana".to_string()),
            ip: "127.0.0.1".to_string(),
            attempted_at: at.to_rfc3339(),
            success: false,
            reason: Some("Contraseña incorrecta".to_string()),
            attempt_number: 1,
        };

        assert_eq!(attempt.timestamp(), Some(at));
    }

    #[test]
    fn test_login_attempt_timestamp_invalid() {
        let attempt = LoginAttempt {
            id: 1,
            subject: None,
            ip: "0.0.0.0".to_string(),
            attempted_at: "not a date".to_string(),
            success: false,
            reason: None,
            attempt_number: 1,
        };

        assert!(attempt.timestamp().is_none());
    }
}
