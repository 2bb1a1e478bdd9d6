use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use fraktum_config::{
    update_feed_url, CONFIG_FILE, GAMES_DIR, LOCK_FILE, LOGS_DIR, PORT_FILE, SAVES_DIR,
};
use fraktum_core::ProfileName;
use fraktum_infra::{ReleaseFeed, VelopackFeed};
use fraktum_persistence::{LauncherStore, ProfilePaths};
use tracing::info;

use crate::bridge::CapabilityBridge;
use crate::launcher::LauncherImpl;
use crate::ports::{Dialogs, InstallPrompt, LauncherPort};
use crate::remote::RemoteFacade;
use crate::updater::{CheckOutcome, UpdateController};

/// Command-line level choices that decide where a host keeps its state.
#[derive(Debug, Clone, Default)]
pub struct HostOptions {
    pub profile: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl HostOptions {
    /// Resolves the profile directory. Named profiles may not shadow any entry the default
    /// profile keeps in its root.
    pub fn profile_paths(&self) -> anyhow::Result<ProfilePaths> {
        let base = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => ProfilePaths::default_base().context("Could not determine data directory")?,
        };
        let profile = self
            .profile
            .as_deref()
            .map(parse_profile)
            .transpose()?;
        Ok(ProfilePaths::resolve(&base, profile.as_ref()))
    }
}

/// Entries of the default profile root; a named profile lives next to them.
const RESERVED_PROFILE_NAMES: [&str; 6] =
    [CONFIG_FILE, SAVES_DIR, GAMES_DIR, LOGS_DIR, LOCK_FILE, PORT_FILE];

fn parse_profile(name: &str) -> anyhow::Result<ProfileName> {
    let profile = ProfileName::parse(name).with_context(|| format!("Invalid profile {name:?}"))?;
    if RESERVED_PROFILE_NAMES.contains(&profile.as_str()) {
        anyhow::bail!("Profile name {name:?} is reserved");
    }
    Ok(profile)
}

pub type DesktopHost<D> = LauncherHost<LauncherImpl, D, VelopackFeed>;

/// Composition root: one store, launcher, update controller and bridge per process.
pub struct LauncherHost<L: LauncherPort, D: Dialogs, F: ReleaseFeed> {
    bridge: Arc<CapabilityBridge<L, D, F>>,
}

impl<D: Dialogs> LauncherHost<LauncherImpl, D, VelopackFeed> {
    pub fn build(
        paths: ProfilePaths,
        dialogs: D,
        prompt: Arc<dyn InstallPrompt>,
    ) -> anyhow::Result<Self> {
        let feed = VelopackFeed::new(update_feed_url());
        Self::from_parts(
            paths,
            LauncherImpl::new(),
            dialogs,
            feed,
            prompt,
            RemoteFacade::offline(),
        )
    }
}

impl<L: LauncherPort, D: Dialogs, F: ReleaseFeed> LauncherHost<L, D, F> {
    pub fn from_parts(
        paths: ProfilePaths,
        launcher: L,
        dialogs: D,
        feed: F,
        prompt: Arc<dyn InstallPrompt>,
        remote: RemoteFacade,
    ) -> anyhow::Result<Self> {
        paths
            .ensure_root()
            .with_context(|| format!("Failed to create {}", paths.root().display()))?;
        info!("Using profile directory {}", paths.root().display());

        let (updates, events) = UpdateController::new(feed, prompt);
        let bridge = CapabilityBridge::new(
            LauncherStore::new(paths),
            launcher,
            dialogs,
            updates,
            events,
        )
        .with_remote(remote);
        Ok(Self {
            bridge: Arc::new(bridge),
        })
    }

    pub fn bridge(&self) -> &Arc<CapabilityBridge<L, D, F>> {
        &self.bridge
    }

    pub fn root(&self) -> &Path {
        self.bridge.profile_root()
    }

    /// Installed builds look for updates as soon as the host is up.
    pub fn startup(&self) -> CheckOutcome {
        let outcome = self.bridge.updates().check_for_updates();
        info!("Startup update check: {outcome:?}");
        outcome
    }

    /// Applies a downloaded update once the process has exited.
    pub fn shutdown(&self) {
        if self.bridge.updates().install_on_exit() {
            info!("Deferred update scheduled");
        }
    }
}
