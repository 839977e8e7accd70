//! SQLite implementation of the audit sink.
//!
//! All three streams are append-only; nothing here ever updates or
//! deletes a row.

use sqlx::SqlitePool;

use crate::db::models::{
    LoginAttempt, NewLoginAttempt, NewPasswordChange, NewSystemEvent, PasswordChange,
};
use crate::db::traits::AuditSink;
use crate::{AccesoError, Result};

/// [`AuditSink`] backed by a sqlx SQLite pool.
#[derive(Clone)]
pub struct SqlAuditSink {
    pool: SqlitePool,
}

impl SqlAuditSink {
    /// Create a sink over the given pool.
    pub fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }
}

impl AuditSink for SqlAuditSink {
    async fn record_login_attempt(&self, record: &NewLoginAttempt) -> Result<()> {
        sqlx::query(
            "INSERT INTO login_attempts (subject, ip, attempted_at, success, reason, attempt_number)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.subject)
        .bind(&record.ip)
        .bind(record.at.to_rfc3339())
        .bind(record.success)
        .bind(&record.reason)
        .bind(record.attempt_number)
        .execute(&self.pool)
        .await
        .map_err(|e| AccesoError::Database(e.to_string()))?;

        Ok(())
    }

    async fn record_system_event(&self, record: &NewSystemEvent) -> Result<()> {
        sqlx::query(
            "INSERT INTO system_events (subject, event_type, description, ip, severity, occurred_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.subject)
        .bind(record.event_type.as_str())
        .bind(&record.description)
        .bind(&record.ip)
        .bind(record.severity.as_str())
        .bind(record.at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AccesoError::Database(e.to_string()))?;

        Ok(())
    }

    async fn record_password_change(&self, record: &NewPasswordChange) -> Result<()> {
        sqlx::query(
            "INSERT INTO password_changes (subject, previous_hash, changed_at, next_change_at, reason)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.subject)
        .bind(&record.previous_hash)
        .bind(record.changed_at.to_rfc3339())
        .bind(record.next_change_at.to_rfc3339())
        .bind(&record.reason)
        .execute(&self.pool)
        .await
        .map_err(|e| AccesoError::Database(e.to_string()))?;

        Ok(())
    }

    async fn last_login_attempt(&self, subject: &str) -> Result<Option<LoginAttempt>> {
        let attempt = sqlx::query_as::<_, LoginAttempt>(
            "SELECT id, subject, ip, attempted_at, success, reason, attempt_number
             FROM login_attempts
             WHERE subject = ?
             ORDER BY attempted_at DESC, id DESC
             LIMIT 1",
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccesoError::Database(e.to_string()))?;

        Ok(attempt)
    }

    async fn last_password_changes(&self, subject: &str, n: usize) -> Result<Vec<PasswordChange>> {
        let records = sqlx::query_as::<_, PasswordChange>(
            "SELECT id, subject, previous_hash, changed_at, next_change_at, reason
             FROM password_changes
             WHERE subject = ?
             ORDER BY changed_at DESC, id DESC
             LIMIT ?",
        )
        .bind(subject)
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AccesoError::Database(e.to_string()))?;

        Ok(records)
    }
}
