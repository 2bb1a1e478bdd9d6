use std::fs;
use std::path::{Path, PathBuf};

use fraktum_core::{ConfigPatch, LauncherConfig};
use tracing::{debug, warn};

use crate::{write_atomically, StorageError};

/// Reads and rewrites `config.json` as a whole record.
///
/// Concurrent `set` calls are not serialized against each other: each one reads, merges and
/// atomically replaces the file, so the last writer wins.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current record. A missing or unreadable file yields the default record.
    pub fn get(&self) -> LauncherConfig {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", self.path.display());
                return LauncherConfig::default();
            }
            Err(e) => {
                warn!("Failed to read {}: {e}; using defaults", self.path.display());
                return LauncherConfig::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Corrupt config {}: {e}; using defaults", self.path.display());
                LauncherConfig::default()
            }
        }
    }

    /// Merges `patch` over the current record and writes the result back.
    pub fn set(&self, patch: &ConfigPatch) -> Result<LauncherConfig, StorageError> {
        let merged = self.get().merged(patch)?;
        let json = serde_json::to_string_pretty(&merged)?;
        write_atomically(&self.path, json.as_bytes())?;
        debug!("Wrote config {}", self.path.display());
        Ok(merged)
    }
}
