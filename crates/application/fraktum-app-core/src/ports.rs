use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fraktum_infra::{LaunchError, LaunchReceipt};

/// Starts processes and opens URLs on behalf of the bridge.
pub trait LauncherPort: Send + Sync + 'static {
    fn launch_detached(&self, exe_path: &Path, args: &[String])
        -> Result<LaunchReceipt, LaunchError>;

    fn open_url(&self, url: &str) -> Result<(), LaunchError>;
}

/// Native file choosers. `None` means the user cancelled.
#[async_trait]
pub trait Dialogs: Send + Sync + 'static {
    async fn pick_executable(&self) -> Option<PathBuf>;

    async fn pick_save_destination(&self, suggested_name: &str) -> Option<PathBuf>;

    /// A save archive to import into a slot.
    async fn pick_save_source(&self) -> Option<PathBuf>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallChoice {
    Now,
    Later,
}

/// Asked once a downloaded update is ready to install.
#[async_trait]
pub trait InstallPrompt: Send + Sync + 'static {
    async fn ask(&self, version: &str) -> InstallChoice;
}

/// Never interrupts the user; the update is applied on exit.
pub struct DeferInstall;

#[async_trait]
impl InstallPrompt for DeferInstall {
    async fn ask(&self, _version: &str) -> InstallChoice {
        InstallChoice::Later
    }
}

/// Dialogs that answer from preset values. Used by headless front ends, where a path comes
/// from the command line rather than a chooser.
///
/// Clones share their answers, so a front end can keep a handle after giving one to the
/// bridge.
#[derive(Debug, Clone, Default)]
pub struct PresetDialogs {
    answers: Arc<Mutex<PresetAnswers>>,
}

#[derive(Debug, Default)]
struct PresetAnswers {
    executable: Option<PathBuf>,
    save_destination: Option<PathBuf>,
    save_source: Option<PathBuf>,
}

impl PresetDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable(self, path: impl Into<PathBuf>) -> Self {
        self.set_executable(Some(path.into()));
        self
    }

    pub fn with_save_destination(self, path: impl Into<PathBuf>) -> Self {
        self.set_save_destination(Some(path.into()));
        self
    }

    pub fn with_save_source(self, path: impl Into<PathBuf>) -> Self {
        self.set_save_source(Some(path.into()));
        self
    }

    pub fn set_executable(&self, path: Option<PathBuf>) {
        lock(&self.answers).executable = path;
    }

    pub fn set_save_destination(&self, path: Option<PathBuf>) {
        lock(&self.answers).save_destination = path;
    }

    pub fn set_save_source(&self, path: Option<PathBuf>) {
        lock(&self.answers).save_source = path;
    }
}

#[async_trait]
impl Dialogs for PresetDialogs {
    async fn pick_executable(&self) -> Option<PathBuf> {
        lock(&self.answers).executable.clone()
    }

    async fn pick_save_destination(&self, _suggested_name: &str) -> Option<PathBuf> {
        lock(&self.answers).save_destination.clone()
    }

    async fn pick_save_source(&self) -> Option<PathBuf> {
        lock(&self.answers).save_source.clone()
    }
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
