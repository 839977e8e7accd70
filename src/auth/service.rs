//! Login orchestration for ACCESO.
//!
//! `AuthService` owns every mutation of a user's blocked flag and
//! failed-attempt counter. The audit streams are written as side effects
//! of each state transition, but always best-effort: a failing sink is
//! logged and never changes the caller-visible outcome.

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::auth::history;
use crate::auth::lockout::{self, FailureOutcome, LockoutStatus};
use crate::auth::password::{hash_password, verify_password, PasswordError};
use crate::auth::token::{CookiePolicy, ModuleGrant, TokenIssuer};
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::db::{
    AuditSink, CredentialStore, EventType, NewLoginAttempt, NewPasswordChange, NewSystemEvent,
    Severity,
};
use crate::{AccesoError, Result};

/// IP recorded for events with no originating request address.
const NO_IP: &str = "0.0.0.0";

/// Result of a successful regular login.
#[derive(Debug, Clone)]
pub struct Session {
    /// Signed session token.
    pub token: String,
    /// Role name at login ("Sin rol" when unassigned).
    pub role: String,
    /// Permission snapshot embedded in the token.
    pub permissions: Vec<ModuleGrant>,
    /// Cookie attributes the HTTP layer should apply.
    pub cookie: CookiePolicy,
}

/// Result of a successful administrator login.
#[derive(Debug, Clone)]
pub struct AdminSession {
    /// Signed session token.
    pub token: String,
    /// Role name (always the configured admin role).
    pub role: String,
    /// Permission snapshot embedded in the token.
    pub permissions: Vec<ModuleGrant>,
    /// Cookie attributes the HTTP layer should apply.
    pub cookie: CookiePolicy,
}

/// Authentication and account-protection service.
///
/// Generic over the credential store, the audit sink and the time source
/// so tests can drive the lockout window without sleeping.
pub struct AuthService<S, A, C> {
    store: S,
    audit: A,
    clock: C,
    tokens: TokenIssuer,
    config: AuthConfig,
}

impl<S, A, C> AuthService<S, A, C>
where
    S: CredentialStore,
    A: AuditSink,
    C: Clock,
{
    /// Create a service over the given collaborators.
    pub fn new(store: S, audit: A, clock: C, config: AuthConfig) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl_mins as u64);
        Self {
            store,
            audit,
            clock,
            tokens,
            config,
        }
    }

    /// The token issuer, for verifying tokens this service produced.
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Authenticate a user and issue a session token.
    ///
    /// Unknown usernames and wrong passwords both surface as
    /// [`AccesoError::InvalidCredentials`] so callers cannot probe which
    /// usernames exist. A blocked account is re-evaluated against the
    /// lockout window here; there is no background unlock.
    pub async fn login(&self, username: &str, password: &str, ip: &str) -> Result<Session> {
        let now = self.clock.now();

        let Some(access) = self.store.find_by_username(username).await? else {
            warn!(username, "login attempt for unknown username");
            self.audit_attempt(NewLoginAttempt {
                subject: None,
                ip: ip.to_string(),
                at: now,
                success: false,
                reason: Some("Usuario no encontrado".to_string()),
                attempt_number: 1,
            })
            .await;
            self.audit_event(NewSystemEvent {
                subject: None,
                event_type: EventType::LoginFailed,
                description: format!(
                    "Intento de inicio de sesión con usuario no registrado: {username}"
                ),
                ip: ip.to_string(),
                severity: Severity::Warning,
                at: now,
            })
            .await;
            return Err(AccesoError::InvalidCredentials);
        };

        let user = &access.user;
        let mut failed_attempts = user.failed_attempts;

        if user.blocked {
            // The window runs from the most recent attempt. A blocked
            // account with no attempt record on file falls through to
            // verification.
            let last = self.audit.last_login_attempt(&user.username).await?;
            if let Some(at) = last.as_ref().and_then(|a| a.timestamp()) {
                match lockout::check_expiry(at, now, self.config.lockout_secs as u64) {
                    LockoutStatus::Locked { remaining_secs } => {
                        return Err(AccesoError::AccountLocked(remaining_secs));
                    }
                    LockoutStatus::Expired => {
                        self.store.update_lock_state(user.id, false, 0).await?;
                        failed_attempts = 0;
                        info!(username = %user.username, "lockout window expired, account unblocked");
                        self.audit_event(NewSystemEvent {
                            subject: Some(user.username.clone()),
                            event_type: EventType::AutoUnblocked,
                            description: format!(
                                "Usuario {} desbloqueado automáticamente tras expirar el periodo de bloqueo",
                                user.username
                            ),
                            ip: ip.to_string(),
                            severity: Severity::Info,
                            at: now,
                        })
                        .await;
                        self.audit_attempt(NewLoginAttempt {
                            subject: Some(user.username.clone()),
                            ip: ip.to_string(),
                            at: now,
                            success: true,
                            reason: Some(
                                "Reinicio de intentos tras desbloqueo automático".to_string(),
                            ),
                            attempt_number: 0,
                        })
                        .await;
                    }
                }
            }
        }

        if !verify_off_thread(password, &user.password).await? {
            let outcome =
                lockout::register_failure(failed_attempts, self.config.max_failed_attempts);
            let attempts = outcome.attempts();
            let blocked = matches!(outcome, FailureOutcome::Blocked { .. });

            // Conditional update: a concurrent attempt that already moved
            // the counter wins; this attempt still reports its computed
            // outcome.
            let applied = self
                .store
                .update_lock_state_if(user.id, blocked, attempts, failed_attempts)
                .await?;
            if !applied {
                debug!(username = %user.username, "failed-attempt counter moved concurrently");
            }

            self.audit_attempt(NewLoginAttempt {
                subject: Some(user.username.clone()),
                ip: ip.to_string(),
                at: now,
                success: false,
                reason: Some("Contraseña incorrecta".to_string()),
                attempt_number: attempts,
            })
            .await;

            return if blocked {
                self.audit_event(NewSystemEvent {
                    subject: Some(user.username.clone()),
                    event_type: EventType::UserBlocked,
                    description: format!(
                        "Usuario {} bloqueado tras {} intentos fallidos",
                        user.username, attempts
                    ),
                    ip: ip.to_string(),
                    severity: Severity::Critical,
                    at: now,
                })
                .await;
                Err(AccesoError::AccountLockedNow)
            } else {
                self.audit_event(NewSystemEvent {
                    subject: Some(user.username.clone()),
                    event_type: EventType::LoginFailed,
                    description: format!(
                        "Intento de inicio de sesión fallido para el usuario {} (intento {} de {})",
                        user.username, attempts, self.config.max_failed_attempts
                    ),
                    ip: ip.to_string(),
                    severity: Severity::Warning,
                    at: now,
                })
                .await;
                Err(AccesoError::InvalidCredentials)
            };
        }

        self.store.update_lock_state(user.id, false, 0).await?;
        self.audit_attempt(NewLoginAttempt {
            subject: Some(user.username.clone()),
            ip: ip.to_string(),
            at: now,
            success: true,
            reason: Some("Reinicio de intentos tras inicio de sesión".to_string()),
            attempt_number: 0,
        })
        .await;
        self.audit_event(NewSystemEvent {
            subject: Some(user.username.clone()),
            event_type: EventType::LoginSuccess,
            description: format!("Inicio de sesión exitoso del usuario {}", user.username),
            ip: ip.to_string(),
            severity: Severity::Info,
            at: now,
        })
        .await;

        let role = access.role_display().to_string();
        let permissions: Vec<ModuleGrant> =
            access.permissions.iter().map(ModuleGrant::from).collect();
        let token = self
            .tokens
            .issue(user.id, &role, permissions.clone(), now.timestamp() as u64)?;

        info!(username = %user.username, role = %role, "login successful");
        Ok(Session {
            token,
            role,
            permissions,
            cookie: CookiePolicy::regular(self.config.cookie_max_age_secs),
        })
    }

    /// Authenticate an administrator.
    ///
    /// Verifies credentials without touching the lockout counters, then
    /// requires the resolved role to be the configured admin role.
    pub async fn login_admin(
        &self,
        username: &str,
        password: &str,
        ip: &str,
    ) -> Result<AdminSession> {
        let now = self.clock.now();

        let Some(access) = self.store.find_by_username(username).await? else {
            return Err(AccesoError::InvalidCredentials);
        };

        if !verify_off_thread(password, &access.user.password).await? {
            return Err(AccesoError::InvalidCredentials);
        }

        if access.role_display() != self.config.admin_role {
            warn!(username, role = access.role_display(), "admin login refused for non-admin role");
            return Err(AccesoError::NotAuthorized);
        }

        self.audit_event(NewSystemEvent {
            subject: Some(access.user.username.clone()),
            event_type: EventType::LoginSuccess,
            description: format!(
                "Inicio de sesión exitoso del administrador {}",
                access.user.username
            ),
            ip: ip.to_string(),
            severity: Severity::Info,
            at: now,
        })
        .await;

        let role = access.role_display().to_string();
        let permissions: Vec<ModuleGrant> =
            access.permissions.iter().map(ModuleGrant::from).collect();
        let token = self.tokens.issue(
            access.user.id,
            &role,
            permissions.clone(),
            now.timestamp() as u64,
        )?;

        info!(username = %access.user.username, "admin login successful");
        Ok(AdminSession {
            token,
            role,
            permissions,
            cookie: CookiePolicy::admin(self.config.cookie_max_age_secs),
        })
    }

    /// Change a user's password.
    ///
    /// The current password must verify, the new one must meet the
    /// minimum length and must not match any hash inside the history
    /// window. The history record is appended before the event so the
    /// replaced hash enters the window immediately.
    pub async fn change_password(&self, user_id: i64, current: &str, new: &str) -> Result<()> {
        let now = self.clock.now();

        let Some(user) = self.store.find_by_id(user_id).await? else {
            return Err(AccesoError::NotFound("user".to_string()));
        };

        if !verify_off_thread(current, &user.password).await? {
            return Err(AccesoError::InvalidCredentials);
        }

        if new.len() < self.config.password_min_length {
            return Err(AccesoError::PasswordTooShort(self.config.password_min_length));
        }

        let records = self
            .audit
            .last_password_changes(&user.username, self.config.password_history_window)
            .await?;
        let candidate = new.to_string();
        let accepted = tokio::task::spawn_blocking(move || history::accepts(&records, &candidate))
            .await
            .map_err(|e| AccesoError::Hash(e.to_string()))?;
        if !accepted {
            return Err(AccesoError::PasswordReused(
                self.config.password_history_window,
            ));
        }

        let new_hash = hash_off_thread(new).await?;
        self.store.update_password(user.id, &new_hash).await?;

        if let Err(e) = self
            .audit
            .record_password_change(&NewPasswordChange {
                subject: user.username.clone(),
                previous_hash: user.password.clone(),
                changed_at: now,
                next_change_at: now + Duration::days(self.config.password_next_change_days),
                reason: "Cambio de contraseña por usuario".to_string(),
            })
            .await
        {
            warn!(error = %e, "failed to record password change");
        }
        self.audit_event(NewSystemEvent {
            subject: Some(user.username.clone()),
            event_type: EventType::PasswordChanged,
            description: format!("El usuario {} cambió su contraseña", user.username),
            ip: NO_IP.to_string(),
            severity: Severity::Info,
            at: now,
        })
        .await;

        info!(username = %user.username, "password changed");
        Ok(())
    }

    /// Block a user by administrative decision.
    ///
    /// Distinct from the automatic lockout: the counter is forced to the
    /// threshold and only the manual unblock or the lockout window frees
    /// the account again.
    pub async fn block_user(&self, user_id: i64, ip: &str) -> Result<()> {
        let now = self.clock.now();

        let Some(user) = self.store.find_by_id(user_id).await? else {
            return Err(AccesoError::NotFound("user".to_string()));
        };

        self.store
            .update_lock_state(user.id, true, self.config.max_failed_attempts)
            .await?;

        self.audit_attempt(NewLoginAttempt {
            subject: Some(user.username.clone()),
            ip: ip.to_string(),
            at: now,
            success: false,
            reason: Some("Bloqueo manual por administrador".to_string()),
            attempt_number: self.config.max_failed_attempts,
        })
        .await;
        self.audit_event(NewSystemEvent {
            subject: Some(user.username.clone()),
            event_type: EventType::ManualBlock,
            description: format!(
                "Usuario {} bloqueado manualmente por administrador",
                user.username
            ),
            ip: ip.to_string(),
            severity: Severity::Critical,
            at: now,
        })
        .await;

        info!(username = %user.username, "user blocked manually");
        Ok(())
    }

    /// Unblock a user by administrative decision and reset the counter.
    pub async fn unblock_user(&self, user_id: i64, ip: &str) -> Result<()> {
        let now = self.clock.now();

        let Some(user) = self.store.find_by_id(user_id).await? else {
            return Err(AccesoError::NotFound("user".to_string()));
        };

        self.store.update_lock_state(user.id, false, 0).await?;

        self.audit_attempt(NewLoginAttempt {
            subject: Some(user.username.clone()),
            ip: ip.to_string(),
            at: now,
            success: true,
            reason: Some("Reinicio de intentos tras desbloqueo manual".to_string()),
            attempt_number: 0,
        })
        .await;
        self.audit_event(NewSystemEvent {
            subject: Some(user.username.clone()),
            event_type: EventType::ManualUnblock,
            description: format!(
                "Usuario {} desbloqueado manualmente por administrador",
                user.username
            ),
            ip: ip.to_string(),
            severity: Severity::Info,
            at: now,
        })
        .await;

        info!(username = %user.username, "user unblocked manually");
        Ok(())
    }

    async fn audit_attempt(&self, record: NewLoginAttempt) {
        if let Err(e) = self.audit.record_login_attempt(&record).await {
            warn!(error = %e, "failed to record login attempt");
        }
    }

    async fn audit_event(&self, record: NewSystemEvent) {
        if let Err(e) = self.audit.record_system_event(&record).await {
            warn!(error = %e, "failed to record system event");
        }
    }
}

/// Run an argon2 verification off the async worker threads.
///
/// Returns `Ok(false)` on a plain mismatch; hash-format and hashing
/// failures propagate as errors.
async fn verify_off_thread(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let outcome = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AccesoError::Hash(e.to_string()))?;

    match outcome {
        Ok(()) => Ok(true),
        Err(PasswordError::VerificationFailed) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Run an argon2 hash computation off the async worker threads.
async fn hash_off_thread(password: &str) -> Result<String> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AccesoError::Hash(e.to_string()))?;

    Ok(hash?)
}
