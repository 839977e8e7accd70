//! End-to-end login, lockout and password-history scenarios against an
//! in-memory SQLite database, with time driven by a manual clock.

use acceso::{
    authorize, hash_password, AccesoError, AuthConfig, AuthService, CrudAction, Database,
    ManualClock, SqlAuditSink, SqlCredentialStore,
};
use chrono::Duration;

type TestService = AuthService<SqlCredentialStore, SqlAuditSink, ManualClock>;

const IP: &str = "10.0.0.1";

async fn setup() -> (Database, ManualClock, TestService) {
    let db = Database::open_in_memory().await.unwrap();
    let clock = ManualClock::starting_now();
    let service = AuthService::new(
        SqlCredentialStore::new(db.pool()),
        SqlAuditSink::new(db.pool()),
        clock.clone(),
        AuthConfig::default(),
    );
    (db, clock, service)
}

async fn seed_user(db: &Database, username: &str, password: &str, failed_attempts: i64) -> i64 {
    let person_id = sqlx::query("INSERT INTO people (first_name, last_name) VALUES (?, 'Prueba')")
        .bind(username)
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid();
    sqlx::query(
        "INSERT INTO users (username, password, blocked, failed_attempts, person_id)
         VALUES (?, ?, 0, ?, ?)",
    )
    .bind(username)
    .bind(hash_password(password).unwrap())
    .bind(failed_attempts)
    .bind(person_id)
    .execute(db.pool())
    .await
    .unwrap()
    .last_insert_rowid()
}

async fn assign_role(db: &Database, user_id: i64, role: &str) -> i64 {
    let role_id = sqlx::query("INSERT INTO roles (name) VALUES (?)")
        .bind(role)
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid();
    sqlx::query("INSERT INTO role_assignments (user_id, role_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(role_id)
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid()
}

async fn lock_state(db: &Database, user_id: i64) -> (bool, i64) {
    sqlx::query_as("SELECT blocked, failed_attempts FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

async fn count_events(db: &Database, event_type: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM system_events WHERE event_type = ?")
        .bind(event_type)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn fifth_failure_locks_the_account() {
    let (db, _clock, service) = setup().await;
    let user_id = seed_user(&db, "ana", "segura123", 4).await;

    let result = service.login("ana", "equivocada", IP).await;
    assert!(matches!(result, Err(AccesoError::AccountLockedNow)));

    let (blocked, attempts) = lock_state(&db, user_id).await;
    assert!(blocked);
    assert_eq!(attempts, 5);

    // Exactly one critical block event and one failed record at attempt 5
    assert_eq!(count_events(&db, "USUARIO_BLOQUEADO").await, 1);
    let severity: String =
        sqlx::query_scalar("SELECT severity FROM system_events WHERE event_type = 'USUARIO_BLOQUEADO'")
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(severity, "CRÍTICO");

    let blocking_attempts: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM login_attempts WHERE subject = 'ana' AND success = 0 AND attempt_number = 5",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(blocking_attempts, 1);
}

#[tokio::test]
async fn counter_counts_up_and_never_exceeds_five() {
    let (db, _clock, service) = setup().await;
    let user_id = seed_user(&db, "ana", "segura123", 0).await;

    for expected in 1..=4 {
        let result = service.login("ana", "equivocada", IP).await;
        assert!(matches!(result, Err(AccesoError::InvalidCredentials)));
        let (blocked, attempts) = lock_state(&db, user_id).await;
        assert!(!blocked);
        assert_eq!(attempts, expected);
    }

    let result = service.login("ana", "equivocada", IP).await;
    assert!(matches!(result, Err(AccesoError::AccountLockedNow)));
    let (blocked, attempts) = lock_state(&db, user_id).await;
    assert!(blocked);
    assert_eq!(attempts, 5);

    // Four below-threshold warnings, then the single block event
    assert_eq!(count_events(&db, "LOGIN_FALLIDO").await, 4);
    assert_eq!(count_events(&db, "USUARIO_BLOQUEADO").await, 1);
}

#[tokio::test]
async fn unknown_username_leaks_nothing_and_touches_no_row() {
    let (db, _clock, service) = setup().await;
    let user_id = seed_user(&db, "ana", "segura123", 0).await;

    let result = service.login("ghost", "cualquiera", IP).await;
    assert!(matches!(result, Err(AccesoError::InvalidCredentials)));

    assert_eq!(count_events(&db, "LOGIN_FALLIDO").await, 1);
    let (subject, severity): (Option<String>, String) =
        sqlx::query_as("SELECT subject, severity FROM system_events WHERE event_type = 'LOGIN_FALLIDO'")
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert!(subject.is_none());
    assert_eq!(severity, "ADVERTENCIA");

    // The attempt record has no subject either
    let attempt_subject: Option<String> =
        sqlx::query_scalar("SELECT subject FROM login_attempts LIMIT 1")
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert!(attempt_subject.is_none());

    let (blocked, attempts) = lock_state(&db, user_id).await;
    assert!(!blocked);
    assert_eq!(attempts, 0);
}

#[tokio::test]
async fn locked_account_reports_remaining_seconds_inside_window() {
    let (db, clock, service) = setup().await;
    seed_user(&db, "ana", "segura123", 4).await;

    // Fifth failure at T locks the account
    let result = service.login("ana", "equivocada", IP).await;
    assert!(matches!(result, Err(AccesoError::AccountLockedNow)));

    clock.advance(Duration::seconds(19));
    match service.login("ana", "segura123", IP).await {
        Err(AccesoError::AccountLocked(remaining)) => assert!(remaining >= 1),
        other => panic!("expected AccountLocked, got {other:?}"),
    }
}

#[tokio::test]
async fn window_expiry_unlocks_on_correct_credentials() {
    let (db, clock, service) = setup().await;
    let user_id = seed_user(&db, "ana", "segura123", 4).await;

    let result = service.login("ana", "equivocada", IP).await;
    assert!(matches!(result, Err(AccesoError::AccountLockedNow)));

    clock.advance(Duration::seconds(21));
    let session = service.login("ana", "segura123", IP).await.unwrap();
    assert_eq!(session.role, "Sin rol");

    let (blocked, attempts) = lock_state(&db, user_id).await;
    assert!(!blocked);
    assert_eq!(attempts, 0);

    assert_eq!(count_events(&db, "DESBLOQUEO_AUTOMATICO").await, 1);
    assert_eq!(count_events(&db, "LOGIN_EXITOSO").await, 1);
}

#[tokio::test]
async fn window_expiry_lifts_block_even_on_wrong_credentials() {
    let (db, clock, service) = setup().await;
    let user_id = seed_user(&db, "ana", "segura123", 4).await;

    let result = service.login("ana", "equivocada", IP).await;
    assert!(matches!(result, Err(AccesoError::AccountLockedNow)));

    clock.advance(Duration::seconds(21));
    let result = service.login("ana", "todavia-mal", IP).await;
    assert!(matches!(result, Err(AccesoError::InvalidCredentials)));

    // The block is lifted as a side effect; the wrong password counts as
    // the first failure of a fresh window
    let (blocked, attempts) = lock_state(&db, user_id).await;
    assert!(!blocked);
    assert_eq!(attempts, 1);
    assert_eq!(count_events(&db, "DESBLOQUEO_AUTOMATICO").await, 1);
}

#[tokio::test]
async fn successful_login_resets_counter() {
    let (db, _clock, service) = setup().await;
    let user_id = seed_user(&db, "ana", "segura123", 3).await;

    service.login("ana", "segura123", IP).await.unwrap();

    let (blocked, attempts) = lock_state(&db, user_id).await;
    assert!(!blocked);
    assert_eq!(attempts, 0);

    let reset_record: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM login_attempts
         WHERE subject = 'ana' AND success = 1 AND attempt_number = 0
           AND reason = 'Reinicio de intentos tras inicio de sesión'",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(reset_record, 1);
}

#[tokio::test]
async fn change_password_rejects_recent_hashes() {
    let (db, _clock, service) = setup().await;
    let user_id = seed_user(&db, "ana", "clave-uno", 0).await;

    service.change_password(user_id, "clave-uno", "clave-dos").await.unwrap();
    service.change_password(user_id, "clave-dos", "clave-tres").await.unwrap();

    // History now holds the hashes of clave-uno and clave-dos
    let result = service.change_password(user_id, "clave-tres", "clave-uno").await;
    assert!(matches!(result, Err(AccesoError::PasswordReused(2))));
    let result = service.change_password(user_id, "clave-tres", "clave-dos").await;
    assert!(matches!(result, Err(AccesoError::PasswordReused(2))));

    // A fresh password passes, and the oldest hash falls out of the window
    service.change_password(user_id, "clave-tres", "clave-cuatro").await.unwrap();
    service.change_password(user_id, "clave-cuatro", "clave-uno").await.unwrap();

    assert_eq!(count_events(&db, "CAMBIO_CONTRASEÑA").await, 4);
    service.login("ana", "clave-uno", IP).await.unwrap();
}

#[tokio::test]
async fn change_password_enforces_minimum_length() {
    let (db, _clock, service) = setup().await;
    let user_id = seed_user(&db, "ana", "segura123", 0).await;

    let result = service.change_password(user_id, "segura123", "corta").await;
    assert!(matches!(result, Err(AccesoError::PasswordTooShort(6))));
    assert_eq!(count_events(&db, "CAMBIO_CONTRASEÑA").await, 0);
}

#[tokio::test]
async fn token_snapshot_drives_authorization() {
    let (db, _clock, service) = setup().await;
    let user_id = seed_user(&db, "ana", "segura123", 0).await;
    let assignment_id = assign_role(&db, user_id, "Docente").await;
    sqlx::query(
        "INSERT INTO permissions (role_assignment_id, module, can_create, can_read)
         VALUES (?, 'notas', 1, 1)",
    )
    .bind(assignment_id)
    .execute(db.pool())
    .await
    .unwrap();

    let session = service.login("ana", "segura123", IP).await.unwrap();
    assert_eq!(session.role, "Docente");

    let claims = service.tokens().verify(&session.token).unwrap();
    assert!(authorize(&claims, "notas", CrudAction::Create));
    assert!(authorize(&claims, "notas", CrudAction::Read));
    assert!(!authorize(&claims, "notas", CrudAction::Delete));
    // No entry for the module means deny, not error
    assert!(!authorize(&claims, "usuarios", CrudAction::Create));
}

#[tokio::test]
async fn admin_login_requires_admin_role_without_lockout_side_effects() {
    let (db, _clock, service) = setup().await;
    let user_id = seed_user(&db, "ana", "segura123", 0).await;
    assign_role(&db, user_id, "Docente").await;

    let result = service.login_admin("ana", "segura123", IP).await;
    assert!(matches!(result, Err(AccesoError::NotAuthorized)));

    // No counter movement and no attempt records from the admin path
    let (blocked, attempts) = lock_state(&db, user_id).await;
    assert!(!blocked);
    assert_eq!(attempts, 0);
    let records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM login_attempts")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(records, 0);
}

#[tokio::test]
async fn admin_login_succeeds_with_strict_cookie() {
    let (db, _clock, service) = setup().await;
    let user_id = seed_user(&db, "marta", "segura123", 0).await;
    assign_role(&db, user_id, "Admin").await;

    let admin = service.login_admin("marta", "segura123", IP).await.unwrap();
    assert_eq!(admin.role, "Admin");
    assert!(admin.cookie.header_value("token", &admin.token).contains("SameSite=Strict"));

    let regular = service.login("marta", "segura123", IP).await.unwrap();
    assert!(regular.cookie.header_value("token", &regular.token).contains("SameSite=Lax"));
}

#[tokio::test]
async fn admin_login_wrong_password_stays_generic() {
    let (db, _clock, service) = setup().await;
    let user_id = seed_user(&db, "marta", "segura123", 0).await;
    assign_role(&db, user_id, "Admin").await;

    let result = service.login_admin("marta", "equivocada", IP).await;
    assert!(matches!(result, Err(AccesoError::InvalidCredentials)));
    let (blocked, attempts) = lock_state(&db, user_id).await;
    assert!(!blocked);
    assert_eq!(attempts, 0);
}

#[tokio::test]
async fn manually_blocked_user_without_recent_attempt_can_retry_after_window() {
    let (db, clock, service) = setup().await;
    let user_id = seed_user(&db, "ana", "segura123", 0).await;

    service.block_user(user_id, IP).await.unwrap();
    assert_eq!(count_events(&db, "BLOQUEO_MANUAL").await, 1);

    // The synthetic block record anchors the window like any other attempt
    match service.login("ana", "segura123", IP).await {
        Err(AccesoError::AccountLocked(remaining)) => assert!(remaining >= 1),
        other => panic!("expected AccountLocked, got {other:?}"),
    }

    clock.advance(Duration::seconds(21));
    service.login("ana", "segura123", IP).await.unwrap();
    let (blocked, attempts) = lock_state(&db, user_id).await;
    assert!(!blocked);
    assert_eq!(attempts, 0);
}
