use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

const DEFAULT_PATH: &str = "saved_mapping.json";
const PATH_ENV: &str = "SAVED_MAPPING_FILE";

/// Persistence for the one saved mapping: a single pretty-printed JSON file,
/// overwritten wholesale on save, read on each request that needs a default.
/// Read-many/write-rare, last-writer-wins; no locking.
#[derive(Debug, Clone)]
pub struct MappingStore {
    path: PathBuf,
}

impl MappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MappingStore { path: path.into() }
    }

    /// Path from `SAVED_MAPPING_FILE`, or `saved_mapping.json` in the
    /// working directory.
    pub fn from_env() -> Self {
        let path = env::var(PATH_ENV).unwrap_or_else(|_| DEFAULT_PATH.to_string());
        MappingStore::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved mapping, or `None` when the file is absent, unreadable or
    /// not a JSON object. A corrupt file is worth a warning but never an
    /// error: requests fall back to detection.
    pub fn load(&self) -> Option<Value> {
        if !self.path.exists() {
            return None;
        }
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "saved mapping unreadable");
                return None;
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(value) if value.is_object() => Some(value),
            Ok(_) => {
                warn!(path = %self.path.display(), "saved mapping is not a JSON object");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "saved mapping is not valid JSON");
                None
            }
        }
    }

    /// Overwrite the saved mapping with pretty-printed JSON.
    pub fn save(&self, mapping: &Value) -> Result<()> {
        let text = serde_json::to_string_pretty(mapping).context("serializing mapping")?;
        fs::write(&self.path, text)
            .with_context(|| format!("writing mapping to `{}`", self.path.display()))?;
        Ok(())
    }
}
