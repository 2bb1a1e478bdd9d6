use std::fs;
use std::path::{Path, PathBuf};

use fraktum_core::SlotId;
use tracing::info;

use crate::paths::save_file_in;
use crate::{write_atomically, StorageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSave {
    pub file: PathBuf,
    pub name: String,
}

/// One blob file per save slot under the profile's saves directory.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, slot: &SlotId) -> PathBuf {
        save_file_in(&self.dir, slot)
    }

    pub fn contains(&self, slot: &SlotId) -> bool {
        self.slot_path(slot).is_file()
    }

    /// Replaces the slot's contents with `bytes`. `name` is a display name only; it defaults
    /// to the stored file's name.
    pub fn upload(
        &self,
        slot: &SlotId,
        name: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredSave, StorageError> {
        fs::create_dir_all(&self.dir)?;
        let file = self.slot_path(slot);
        write_atomically(&file, bytes)?;
        info!("Stored save slot {slot} ({} bytes)", bytes.len());

        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_owned(),
            None => file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| slot.to_string()),
        };
        Ok(StoredSave { file, name })
    }

    pub fn read(&self, slot: &SlotId) -> Result<Vec<u8>, StorageError> {
        let file = self.slot_path(slot);
        if !file.is_file() {
            return Err(StorageError::EmptySlot(slot.to_string()));
        }
        Ok(fs::read(file)?)
    }

    /// Copies the slot to `dest`. Fails with [`StorageError::EmptySlot`] for a slot that was
    /// never uploaded. Exporting a slot onto its own file leaves it untouched.
    pub fn export(&self, slot: &SlotId, dest: &Path) -> Result<PathBuf, StorageError> {
        let file = self.slot_path(slot);
        if !file.is_file() {
            return Err(StorageError::EmptySlot(slot.to_string()));
        }
        if is_same_file(&file, dest) {
            info!("Save slot {slot} is already at {}", dest.display());
            return Ok(dest.to_path_buf());
        }
        fs::copy(&file, dest)?;
        info!("Exported save slot {slot} to {}", dest.display());
        Ok(dest.to_path_buf())
    }
}

/// `fs::copy` truncates its destination before reading the source, so copying a file onto
/// itself (directly, through a symlink or through a hard link) empties it.
fn is_same_file(a: &Path, b: &Path) -> bool {
    let (Ok(a), Ok(b)) = (fs::canonicalize(a), fs::canonicalize(b)) else {
        return false;
    };
    if a == b {
        return true;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if let (Ok(a), Ok(b)) = (fs::metadata(&a), fs::metadata(&b)) {
            return a.dev() == b.dev() && a.ino() == b.ino();
        }
    }
    false
}
