//! User snapshot persistence.
//!
//! The whole account list is written as one pretty-printed JSON array at
//! shutdown and read back at the next startup. Nothing writes it while the
//! server runs; the in-memory store is the live truth between the two.

use std::fs;
use std::path::Path;

use palaver_users::User;

use crate::PalaverError;

/// Loads the account list from a snapshot file. A missing file means a
/// first run: empty list, not an error.
pub fn load_users(path: impl AsRef<Path>) -> Result<Vec<User>, PalaverError> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => {
            let users: Vec<User> = serde_json::from_str(&text)?;
            tracing::info!(
                path = %path.display(),
                accounts = users.len(),
                "loaded user snapshot"
            );
            Ok(users)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(
                path = %path.display(),
                "no user snapshot, starting empty"
            );
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Writes the account list to a snapshot file, replacing any previous one.
pub fn save_users(
    path: impl AsRef<Path>,
    users: &[User],
) -> Result<(), PalaverError> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(users)?;
    fs::write(path, text)?;
    tracing::info!(
        path = %path.display(),
        accounts = users.len(),
        "saved user snapshot"
    );
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================
