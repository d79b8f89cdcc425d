//! The flat key-value settings file.
//!
//! Settings live in one JSON object of string pairs. Reads go through
//! [`Settings::get`], which writes the supplied default into the map when
//! the key is absent — after one run with defaults the file shows every
//! key the server consulted, ready to be edited.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::PalaverError;

/// The settings store for one file.
#[derive(Debug)]
pub struct Settings {
    path: PathBuf,
    items: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the given file. A missing file is an empty
    /// store, not an error; a present but malformed file is.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PalaverError> {
        let path = path.as_ref().to_path_buf();
        let items = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %path.display(),
                    "no settings file, starting with defaults"
                );
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, items })
    }

    /// Reads a setting, inserting the default when the key is absent.
    pub fn get(&mut self, key: &str, default: &str) -> String {
        self.items
            .entry(key.to_string())
            .or_insert_with(|| default.to_string())
            .clone()
    }

    /// Sets a key to a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.items.insert(key.into(), value.into());
    }

    /// Writes the store back to its file.
    pub fn save(&self) -> Result<(), PalaverError> {
        let text = serde_json::to_string_pretty(&self.items)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================
