//! User registration for ACCESO.

use tracing::info;

use crate::auth::{hash_password, validate_password};
use crate::db::{CredentialStore, NewUser, User};
use crate::{AccesoError, Result};

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username.
    pub username: String,
    /// Plain-text password (6-128 characters).
    pub password: String,
    /// Person record the new account belongs to.
    pub person_id: i64,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(username: impl Into<String>, password: impl Into<String>, person_id: i64) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            person_id,
        }
    }
}

/// Register a new user.
///
/// This function:
/// 1. Validates the username and password
/// 2. Checks the username is free and the person exists
/// 3. Hashes the password
/// 4. Creates the user in the store
pub async fn register<S: CredentialStore>(store: &S, request: &RegistrationRequest) -> Result<User> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(AccesoError::Validation("username is required".to_string()));
    }

    validate_password(&request.password)?;

    if store.username_exists(username).await? {
        return Err(AccesoError::Validation(
            "username already exists".to_string(),
        ));
    }

    if !store.person_exists(request.person_id).await? {
        return Err(AccesoError::NotFound("persona".to_string()));
    }

    let hash = hash_password(&request.password)?;
    let user = store
        .create_user(&NewUser::new(username, hash, request.person_id))
        .await?;

    info!(username = %user.username, "registered new user");
    Ok(user)
}
