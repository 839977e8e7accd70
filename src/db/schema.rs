//! Database schema migrations for ACCESO.
//!
//! Each entry is applied once, in order; the applied version is tracked in
//! the `schema_version` table.

/// Ordered list of schema migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: identity tables
    r#"
    CREATE TABLE people (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT
    );

    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        blocked INTEGER NOT NULL DEFAULT 0,
        failed_attempts INTEGER NOT NULL DEFAULT 0,
        person_id INTEGER NOT NULL REFERENCES people(id),
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE roles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE role_assignments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        role_id INTEGER NOT NULL REFERENCES roles(id)
    );

    CREATE TABLE permissions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        role_assignment_id INTEGER NOT NULL REFERENCES role_assignments(id),
        module TEXT NOT NULL,
        can_create INTEGER NOT NULL DEFAULT 0,
        can_update INTEGER NOT NULL DEFAULT 0,
        can_delete INTEGER NOT NULL DEFAULT 0,
        can_read INTEGER NOT NULL DEFAULT 0,
        can_report INTEGER NOT NULL DEFAULT 0
    );
    "#,
    // v2: append-only audit streams
    r#"
    CREATE TABLE login_attempts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subject TEXT,
        ip TEXT NOT NULL,
        attempted_at TEXT NOT NULL,
        success INTEGER NOT NULL,
        reason TEXT,
        attempt_number INTEGER NOT NULL
    );
    CREATE INDEX idx_login_attempts_subject ON login_attempts(subject, attempted_at DESC);

    CREATE TABLE password_changes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subject TEXT NOT NULL,
        previous_hash TEXT NOT NULL,
        changed_at TEXT NOT NULL,
        next_change_at TEXT NOT NULL,
        reason TEXT NOT NULL
    );
    CREATE INDEX idx_password_changes_subject ON password_changes(subject, changed_at DESC);

    CREATE TABLE system_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subject TEXT,
        event_type TEXT NOT NULL,
        description TEXT NOT NULL,
        ip TEXT NOT NULL,
        severity TEXT NOT NULL,
        occurred_at TEXT NOT NULL
    );
    "#,
];
