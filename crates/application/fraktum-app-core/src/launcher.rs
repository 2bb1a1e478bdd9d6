use std::path::Path;

use fraktum_infra::launcher::open_url;
use fraktum_infra::{LaunchError, LaunchReceipt, Launcher};

use crate::ports::LauncherPort;

pub struct LauncherImpl;

impl Default for LauncherImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl LauncherImpl {
    pub fn new() -> Self {
        Self
    }
}

impl LauncherPort for LauncherImpl {
    fn launch_detached(
        &self,
        exe_path: &Path,
        args: &[String],
    ) -> Result<LaunchReceipt, LaunchError> {
        Launcher::new(exe_path).launch_detached(args)
    }

    fn open_url(&self, url: &str) -> Result<(), LaunchError> {
        open_url(url)
    }
}
