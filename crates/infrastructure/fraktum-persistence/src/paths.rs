use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use fraktum_config::{
    APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, CONFIG_FILE, DATA_DIR_ENV, GAMES_DIR, LOCK_FILE,
    LOGS_DIR, PORT_FILE, SAVES_DIR, SAVE_EXTENSION,
};
use fraktum_core::{ProfileName, SafeSegment, SlotId};

use crate::StorageError;

/// Root directory of one launcher profile and the layout beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePaths {
    root: PathBuf,
}

impl ProfilePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The base directory profiles live under: `FRAKTUM_DATA_DIR` if set, otherwise the
    /// platform data directory.
    pub fn default_base() -> Result<PathBuf, StorageError> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .ok_or(StorageError::NoDataDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// The default profile is the base directory itself; a named profile is a child of it.
    pub fn resolve(base: &Path, profile: Option<&ProfileName>) -> Self {
        match profile {
            Some(name) => Self::new(base.join(name.as_str())),
            None => Self::new(base),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn saves_dir(&self) -> PathBuf {
        self.root.join(SAVES_DIR)
    }

    pub fn save_file(&self, slot: &SlotId) -> PathBuf {
        save_file_in(&self.saves_dir(), slot)
    }

    pub fn games_dir(&self) -> PathBuf {
        self.root.join(GAMES_DIR)
    }

    /// `games/<game>/<version>`, created if missing.
    pub fn game_build_dir(
        &self,
        game: &SafeSegment,
        version: &SafeSegment,
    ) -> Result<PathBuf, StorageError> {
        let dir = self.games_dir().join(game.as_str()).join(version.as_str());
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    pub fn port_file(&self) -> PathBuf {
        self.root.join(PORT_FILE)
    }

    pub fn ensure_root(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

pub(crate) fn save_file_in(saves_dir: &Path, slot: &SlotId) -> PathBuf {
    saves_dir.join(format!("{}.{}", slot.as_str(), SAVE_EXTENSION))
}
