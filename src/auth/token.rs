//! Session tokens and cookie policy.
//!
//! Tokens are HS256 JWTs whose claims snapshot the user's role and
//! permissions at issuance. Changing a role or permission afterwards does
//! not touch tokens already in flight; they keep the snapshot until they
//! expire.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::ModulePermission;
use crate::{AccesoError, Result};

/// Capabilities granted on one module, as carried in token claims.
///
/// Field names match the legacy wire format so existing consumers keep
/// decoding tokens unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub crear: bool,
    pub actualizar: bool,
    pub eliminar: bool,
    pub leer: bool,
    pub reportes: bool,
}

/// Permissions for one module inside the token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleGrant {
    /// Module name.
    pub modulo: String,
    /// Capabilities granted on the module.
    pub permisos: Grant,
}

impl From<&ModulePermission> for ModuleGrant {
    fn from(p: &ModulePermission) -> Self {
        Self {
            modulo: p.module.clone(),
            permisos: Grant {
                crear: p.can_create,
                actualizar: p.can_update,
                eliminar: p.can_delete,
                leer: p.can_read,
                reportes: p.can_report,
            },
        }
    }
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: i64,
    /// Role name at issuance.
    pub rol: String,
    /// Permission snapshot at issuance.
    pub permisos: Vec<ModuleGrant>,
    /// Issued at timestamp.
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
    /// JWT ID (unique identifier).
    pub jti: String,
}

/// Signs and verifies session tokens with a shared HS256 secret.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_mins: u64,
}

impl TokenIssuer {
    /// Create an issuer from a secret key and token lifetime in minutes.
    pub fn new(secret: &str, ttl_mins: u64) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_mins,
        }
    }

    /// Issue a token for a user with the given role and permission snapshot.
    ///
    /// `now` is a unix timestamp in seconds; expiry lands at
    /// `now + ttl_mins * 60`.
    pub fn issue(
        &self,
        user_id: i64,
        role: &str,
        grants: Vec<ModuleGrant>,
        now: u64,
    ) -> Result<String> {
        let claims = Claims {
            sub: user_id,
            rol: role.to_string(),
            permisos: grants,
            iat: now,
            exp: now + self.ttl_mins * 60,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AccesoError::Token(e.to_string()))
    }

    /// Verify a token's signature and expiry, returning its claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AccesoError::Token(e.to_string()))?;
        Ok(data.claims)
    }
}

/// SameSite attribute for the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
        }
    }
}

/// Cookie attributes a front end should apply to the session token.
///
/// Cookie lifetime is deliberately longer than token lifetime; the token's
/// own `exp` is what ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub http_only: bool,
    pub same_site: SameSite,
    pub max_age_secs: u64,
}

impl CookiePolicy {
    /// Policy for administrator sessions.
    pub fn admin(max_age_secs: u64) -> Self {
        Self {
            http_only: true,
            same_site: SameSite::Strict,
            max_age_secs,
        }
    }

    /// Policy for regular sessions.
    pub fn regular(max_age_secs: u64) -> Self {
        Self {
            http_only: true,
            same_site: SameSite::Lax,
            max_age_secs,
        }
    }

    /// Render a `Set-Cookie` header value for the given token.
    pub fn header_value(&self, name: &str, token: &str) -> String {
        let mut value = format!(
            "{name}={token}; Max-Age={}; SameSite={}; Path=/",
            self.max_age_secs,
            self.same_site.as_str()
        );
        if self.http_only {
            value.push_str("; HttpOnly");
        }
        value
    }
}
