//! Release feed access. `VelopackFeed` talks to the installed velopack runtime; the
//! [`ReleaseFeed`] trait lets the update controller run against other feeds in tests.

use std::sync::mpsc;
use std::thread;

use fraktum_config::build_version_string;
use fraktum_core::ErrorKind;
use thiserror::Error;
use tracing::{debug, info};
use velopack::{sources, UpdateCheck, UpdateInfo, UpdateManager};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("updater unavailable: {0}")]
    Unavailable(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error(transparent)]
    Velopack(#[from] velopack::Error),
}

impl UpdateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpdateError::Unavailable(_) => ErrorKind::UpdaterUnavailable,
            UpdateError::Network(_) | UpdateError::Velopack(_) => ErrorKind::NetworkFailure,
        }
    }
}

/// A newer release found on the feed.
#[derive(Debug, Clone)]
pub struct AvailableRelease<R> {
    pub version: String,
    pub total_bytes: u64,
    pub release: R,
}

/// Blocking access to a release feed. Callers run these off the async executor.
pub trait ReleaseFeed: Send + Sync + 'static {
    type Release: Clone + Send + Sync + 'static;

    /// True when running from an installed package the feed can update.
    fn is_packaged(&self) -> bool;

    /// Why the feed cannot be used at all, if it cannot.
    fn unavailable_reason(&self) -> Option<String> {
        None
    }

    fn check(&self) -> Result<Option<AvailableRelease<Self::Release>>, UpdateError>;

    /// Downloads `release`, reporting raw percentages through `progress`.
    fn download(
        &self,
        release: &Self::Release,
        progress: &(dyn Fn(i32) + Send + Sync),
    ) -> Result<(), UpdateError>;

    /// Applies a downloaded release and restarts into it. Returns only on failure.
    fn apply_and_restart(&self, release: &Self::Release) -> Result<(), UpdateError>;

    /// Schedules a downloaded release to be applied after this process exits.
    fn apply_on_exit(&self, release: &Self::Release) -> Result<(), UpdateError>;
}

pub fn is_packaged_build() -> bool {
    UpdateManager::new(sources::NoneSource {}, None, None).is_ok()
}

pub fn installed_version_string() -> String {
    UpdateManager::new(sources::NoneSource {}, None, None)
        .map(|um| um.get_current_version_as_string())
        .unwrap_or_else(|_| build_version_string().to_owned())
}

pub struct VelopackFeed {
    feed_url: Option<String>,
}

impl VelopackFeed {
    /// `None` disables the feed; every operation then reports the updater as unavailable.
    pub fn new(feed_url: Option<String>) -> Self {
        Self { feed_url }
    }

    pub fn feed_url(&self) -> Option<&str> {
        self.feed_url.as_deref()
    }

    fn manager(&self) -> Result<UpdateManager, UpdateError> {
        let url = self
            .feed_url
            .clone()
            .ok_or_else(|| UpdateError::Unavailable("no release feed configured".into()))?;
        UpdateManager::new(sources::HttpSource::new(url), None, None)
            .map_err(|e| UpdateError::Unavailable(e.to_string()))
    }
}

impl ReleaseFeed for VelopackFeed {
    type Release = UpdateInfo;

    fn is_packaged(&self) -> bool {
        is_packaged_build()
    }

    fn unavailable_reason(&self) -> Option<String> {
        match self.feed_url {
            Some(_) => None,
            None => Some("no release feed configured".into()),
        }
    }

    fn check(&self) -> Result<Option<AvailableRelease<UpdateInfo>>, UpdateError> {
        let um = self.manager()?;
        match um.check_for_updates() {
            Ok(UpdateCheck::UpdateAvailable(update)) => {
                let version = update.TargetFullRelease.Version.clone();
                let total_bytes = update.TargetFullRelease.Size;
                info!("Update available: {version} ({total_bytes} bytes)");
                Ok(Some(AvailableRelease {
                    version,
                    total_bytes,
                    release: update,
                }))
            }
            Ok(UpdateCheck::NoUpdateAvailable) | Ok(UpdateCheck::RemoteIsEmpty) => {
                debug!("No update available");
                Ok(None)
            }
            Err(e) => Err(UpdateError::Network(e.to_string())),
        }
    }

    fn download(
        &self,
        release: &UpdateInfo,
        progress: &(dyn Fn(i32) + Send + Sync),
    ) -> Result<(), UpdateError> {
        let um = self.manager()?;
        let (tx, rx) = mpsc::channel::<i16>();

        thread::scope(|scope| {
            scope.spawn(move || {
                while let Ok(pct) = rx.recv() {
                    progress(i32::from(pct));
                }
            });
            // Dropping the sender inside download_updates ends the forwarding thread.
            um.download_updates(release, Some(tx))
                .map_err(|e| UpdateError::Network(e.to_string()))
        })
    }

    fn apply_and_restart(&self, release: &UpdateInfo) -> Result<(), UpdateError> {
        let um = self.manager()?;
        um.apply_updates_and_restart(release)?;
        Ok(())
    }

    fn apply_on_exit(&self, release: &UpdateInfo) -> Result<(), UpdateError> {
        let um = self.manager()?;
        um.wait_exit_then_apply_updates(release, true, false, Vec::<String>::new())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_feed_is_unavailable() {
        let feed = VelopackFeed::new(None);
        assert!(feed.unavailable_reason().is_some());

        let err = feed.check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpdaterUnavailable);
    }

    #[test]
    fn installed_version_falls_back_to_build_version() {
        // Test binaries never run from an installed package.
        assert_eq!(installed_version_string(), build_version_string());
    }
}
