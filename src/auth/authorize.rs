//! Permission checks against a token's claim snapshot.

use crate::auth::token::Claims;

/// CRUD-style action a permission check asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudAction {
    Create,
    Update,
    Delete,
    Read,
    Report,
}

/// Check whether the claims grant `action` on `module`.
///
/// The check runs entirely against the snapshot in the claims; no store
/// lookup happens here. A module absent from the snapshot denies every
/// action on it.
pub fn authorize(claims: &Claims, module: &str, action: CrudAction) -> bool {
    let Some(grant) = claims.permisos.iter().find(|g| g.modulo == module) else {
        return false;
    };

    match action {
        CrudAction::Create => grant.permisos.crear,
        CrudAction::Update => grant.permisos.actualizar,
        CrudAction::Delete => grant.permisos.eliminar,
        CrudAction::Read => grant.permisos.leer,
        CrudAction::Report => grant.permisos.reportes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::{Grant, ModuleGrant};

    fn claims() -> Claims {
        Claims {
            sub: 1,
            rol: "Docente".to_string(),
            permisos: vec![ModuleGrant {
                modulo: "notas".to_string(),
                permisos: Grant {
                    crear: true,
                    actualizar: true,
                    eliminar: false,
                    leer: true,
                    reportes: false,
                },
            }],
            iat: 0,
            exp: 0,
            jti: "test".to_string(),
        }
    }

    #[test]
    fn test_granted_actions() {
        let claims = claims();
        assert!(authorize(&claims, "notas", CrudAction::Create));
        assert!(authorize(&claims, "notas", CrudAction::Update));
        assert!(authorize(&claims, "notas", CrudAction::Read));
    }

    #[test]
    fn test_denied_actions() {
        let claims = claims();
        assert!(!authorize(&claims, "notas", CrudAction::Delete));
        assert!(!authorize(&claims, "notas", CrudAction::Report));
    }

    #[test]
    fn test_missing_module_denies_everything() {
        let claims = claims();
        assert!(!authorize(&claims, "usuarios", CrudAction::Read));
        assert!(!authorize(&claims, "usuarios", CrudAction::Create));
    }

    #[test]
    fn test_empty_snapshot_denies() {
        let mut claims = claims();
        claims.permisos.clear();
        assert!(!authorize(&claims, "notas", CrudAction::Read));
    }
}
