#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fraktum_app_core::{
    CapabilityBridge, DeferInstall, LauncherPort, PresetDialogs, UpdateController,
};
use fraktum_infra::{AvailableRelease, LaunchError, LaunchReceipt, ReleaseFeed, UpdateError};
use fraktum_persistence::{LauncherStore, ProfilePaths};

pub type TestBridge = CapabilityBridge<RecordingLauncher, PresetDialogs, DevFeed>;

/// Records launches instead of starting processes.
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    pub spawns: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
    pub opened: Arc<Mutex<Vec<String>>>,
    pub fail_spawn: bool,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        Self {
            fail_spawn: true,
            ..Self::default()
        }
    }

    pub fn spawn_count(&self) -> usize {
        self.spawns.lock().unwrap().len()
    }
}

impl LauncherPort for RecordingLauncher {
    fn launch_detached(
        &self,
        exe_path: &Path,
        args: &[String],
    ) -> Result<LaunchReceipt, LaunchError> {
        if self.fail_spawn {
            return Err(LaunchError::Spawn {
                program: exe_path.display().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            });
        }
        self.spawns
            .lock()
            .unwrap()
            .push((exe_path.to_path_buf(), args.to_vec()));
        Ok(LaunchReceipt { pid: 4242 })
    }

    fn open_url(&self, url: &str) -> Result<(), LaunchError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// A development build: nothing to update.
pub struct DevFeed;

impl ReleaseFeed for DevFeed {
    type Release = ();

    fn is_packaged(&self) -> bool {
        false
    }

    fn check(&self) -> Result<Option<AvailableRelease<()>>, UpdateError> {
        Ok(None)
    }

    fn download(
        &self,
        _release: &(),
        _progress: &(dyn Fn(i32) + Send + Sync),
    ) -> Result<(), UpdateError> {
        Ok(())
    }

    fn apply_and_restart(&self, _release: &()) -> Result<(), UpdateError> {
        Ok(())
    }

    fn apply_on_exit(&self, _release: &()) -> Result<(), UpdateError> {
        Ok(())
    }
}

pub fn bridge_at(root: &Path, launcher: RecordingLauncher) -> TestBridge {
    bridge_with_dialogs(root, launcher).0
}

/// Also returns a handle on the bridge's dialogs for presetting chooser answers.
pub fn bridge_with_dialogs(
    root: &Path,
    launcher: RecordingLauncher,
) -> (TestBridge, PresetDialogs) {
    let dialogs = PresetDialogs::new();
    let (updates, events) = UpdateController::new(DevFeed, Arc::new(DeferInstall));
    let bridge = CapabilityBridge::new(
        LauncherStore::new(ProfilePaths::new(root)),
        launcher,
        dialogs.clone(),
        updates,
        events,
    )
    .with_app_version("1.0.0-test");
    (bridge, dialogs)
}
