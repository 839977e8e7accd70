//! SQLite implementation of the credential store.

use sqlx::SqlitePool;

use crate::db::models::{ModulePermission, NewUser, User, UserAccess};
use crate::db::traits::CredentialStore;
use crate::{AccesoError, Result};

/// [`CredentialStore`] backed by a sqlx SQLite pool.
#[derive(Clone)]
pub struct SqlCredentialStore {
    pool: SqlitePool,
}

impl SqlCredentialStore {
    /// Create a store over the given pool.
    pub fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }
}

impl CredentialStore for SqlCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccess>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, blocked, failed_attempts, person_id, created_at
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccesoError::Database(e.to_string()))?;

        let Some(user) = user else {
            return Ok(None);
        };

        // First assignment by ascending id wins when several exist.
        let assignment = sqlx::query_as::<_, (i64, String)>(
            "SELECT ra.id, r.name
             FROM role_assignments ra
             JOIN roles r ON r.id = ra.role_id
             WHERE ra.user_id = ?
             ORDER BY ra.id
             LIMIT 1",
        )
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccesoError::Database(e.to_string()))?;

        let (role_name, permissions) = match assignment {
            Some((assignment_id, role_name)) => {
                let permissions = sqlx::query_as::<_, ModulePermission>(
                    "SELECT module, can_create, can_update, can_delete, can_read, can_report
                     FROM permissions
                     WHERE role_assignment_id = ?
                     ORDER BY module",
                )
                .bind(assignment_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AccesoError::Database(e.to_string()))?;

                (Some(role_name), permissions)
            }
            None => (None, Vec::new()),
        };

        Ok(Some(UserAccess {
            user,
            role_name,
            permissions,
        }))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, blocked, failed_attempts, person_id, created_at
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccesoError::Database(e.to_string()))?;

        Ok(user)
    }

    async fn update_lock_state(&self, id: i64, blocked: bool, failed_attempts: i64) -> Result<()> {
        sqlx::query("UPDATE users SET blocked = ?, failed_attempts = ? WHERE id = ?")
            .bind(blocked)
            .bind(failed_attempts)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AccesoError::Database(e.to_string()))?;

        Ok(())
    }

    async fn update_lock_state_if(
        &self,
        id: i64,
        blocked: bool,
        failed_attempts: i64,
        expected_attempts: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET blocked = ?, failed_attempts = ?
             WHERE id = ? AND failed_attempts = ?",
        )
        .bind(blocked)
        .bind(failed_attempts)
        .bind(id)
        .bind(expected_attempts)
        .execute(&self.pool)
        .await
        .map_err(|e| AccesoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password(&self, id: i64, new_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(new_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AccesoError::Database(e.to_string()))?;

        Ok(())
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (username, password, blocked, failed_attempts, person_id)
             VALUES (?, ?, 0, 0, ?)",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .bind(new_user.person_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AccesoError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AccesoError::NotFound("user".to_string()))
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AccesoError::Database(e.to_string()))?;

        // Permissions hang off role assignments, so they go first.
        sqlx::query(
            "DELETE FROM permissions WHERE role_assignment_id IN
             (SELECT id FROM role_assignments WHERE user_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AccesoError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM role_assignments WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AccesoError::Database(e.to_string()))?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AccesoError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AccesoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AccesoError::Database(e.to_string()))?;

        Ok(exists)
    }

    async fn person_exists(&self, person_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM people WHERE id = ?)")
            .bind(person_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AccesoError::Database(e.to_string()))?;

        Ok(exists)
    }
}
