mod atomic;
mod config_store;
mod error;
mod paths;
mod saves;

pub use atomic::write_atomically;
pub use config_store::ConfigStore;
pub use error::*;
pub use paths::ProfilePaths;
pub use saves::{SaveStore, StoredSave};

/// Everything a single profile persists, behind one handle.
#[derive(Debug, Clone)]
pub struct LauncherStore {
    paths: ProfilePaths,
    config: ConfigStore,
    saves: SaveStore,
}

impl LauncherStore {
    pub fn new(paths: ProfilePaths) -> Self {
        Self {
            config: ConfigStore::new(paths.config_file()),
            saves: SaveStore::new(paths.saves_dir()),
            paths,
        }
    }

    pub fn paths(&self) -> &ProfilePaths {
        &self.paths
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn saves(&self) -> &SaveStore {
        &self.saves
    }
}
