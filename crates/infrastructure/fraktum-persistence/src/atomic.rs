use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::StorageError;

/// Writes `contents` to `path` so that readers see either the old file or the new one.
///
/// Parent directories are created. The temp file name is unique per call so concurrent
/// writers to the same destination never interleave bytes; the last rename wins.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    let result = write_and_rename(&tmp_path, path, contents);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    PathBuf::from(name)
}

fn write_and_rename(tmp_path: &Path, path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let mut file = fs::File::create(tmp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    match fs::rename(tmp_path, path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            fs::remove_file(path).ok();
            fs::rename(tmp_path, path)?;
        }
        Err(e) => return Err(e.into()),
    }

    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parents_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("config.json");

        write_atomically(&target, b"{}").unwrap();
        write_atomically(&target, b"{\"exePath\":null}").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"{\"exePath\":null}");
        let leftovers: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
