//! Password history enforcement.
//!
//! A new password is rejected when it verifies against any of the stored
//! hashes inside the history window. History records carry the hash each
//! change replaced; the caller appends the record for the change it is
//! about to make.

use tracing::debug;

use crate::auth::password::verify_password;
use crate::db::PasswordChange;

/// How many previous password hashes a new password is checked against.
pub const HISTORY_WINDOW: usize = 2;

/// Check a candidate password against recent history records.
///
/// Returns `true` when the candidate matches none of them. A stored hash
/// that fails to parse is skipped rather than treated as a match.
pub fn accepts(records: &[PasswordChange], candidate: &str) -> bool {
    for record in records {
        if verify_password(candidate, &record.previous_hash).is_ok() {
            debug!(subject = %record.subject, "candidate password found in history");
            return false;
        }
    }
    true
}
