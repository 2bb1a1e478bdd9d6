//! Self-update lifecycle: check, automatic download, install prompt, install now or on exit.
//!
//! The controller owns the only [`UpdateState`] of the process and the only sender of the
//! update event channel. Feed calls block, so they run on the blocking pool.

use std::sync::{Arc, Mutex};

use fraktum_core::{
    InvalidTransition, ProgressTracker, UpdateEvent, UpdatePhase, UpdateProgress, UpdateState,
};
use fraktum_infra::{AvailableRelease, ReleaseFeed, UpdateError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::ports::{lock, InstallChoice, InstallPrompt};

pub type UpdateEvents = mpsc::UnboundedReceiver<UpdateEvent>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// A cycle was started, or one is already running.
    Accepted,
    /// Not an installed build; nothing to update.
    NotApplicable,
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuitOutcome {
    Applied,
    InProgress,
    NotApplicable,
    NothingDownloaded,
    Failed(String),
}

struct Downloaded<R> {
    version: String,
    release: R,
}

struct Shared<F: ReleaseFeed> {
    feed: F,
    prompt: Arc<dyn InstallPrompt>,
    state: Mutex<UpdateState>,
    downloaded: Mutex<Option<Downloaded<F::Release>>>,
    events: mpsc::UnboundedSender<UpdateEvent>,
}

pub struct UpdateController<F: ReleaseFeed> {
    shared: Arc<Shared<F>>,
}

impl<F: ReleaseFeed> Clone for UpdateController<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: ReleaseFeed> UpdateController<F> {
    /// Returns the controller and the single receiving end of its event stream.
    pub fn new(feed: F, prompt: Arc<dyn InstallPrompt>) -> (Self, UpdateEvents) {
        let (events, rx) = mpsc::unbounded_channel();
        let shared = Shared {
            feed,
            prompt,
            state: Mutex::new(UpdateState::idle()),
            downloaded: Mutex::new(None),
            events,
        };
        (
            Self {
                shared: Arc::new(shared),
            },
            rx,
        )
    }

    pub fn is_packaged(&self) -> bool {
        self.shared.feed.is_packaged()
    }

    pub fn state(&self) -> UpdateState {
        lock(&self.shared.state).clone()
    }

    pub fn feed(&self) -> &F {
        &self.shared.feed
    }

    /// Starts a check/download cycle in the background unless one is already running.
    pub fn check_for_updates(&self) -> CheckOutcome {
        if !self.is_packaged() {
            debug!("Skipping update check: not an installed build");
            return CheckOutcome::NotApplicable;
        }
        if let Some(reason) = self.shared.feed.unavailable_reason() {
            warn!("Updater unavailable: {reason}");
            return CheckOutcome::Unavailable(reason);
        }

        {
            let mut state = lock(&self.shared.state);
            if state.phase().is_cycle_active() {
                debug!("Update cycle already running ({:?})", state.phase());
                return CheckOutcome::Accepted;
            }
            if let Err(e) = state.begin_check() {
                warn!("Cannot start update check: {e}");
                return CheckOutcome::Accepted;
            }
            let _ = self.shared.events.send(UpdateEvent::checking());
        }

        let shared = Arc::clone(&self.shared);
        if let Err(e) = crate::async_runtime::spawn(shared.run_cycle()) {
            self.shared.fail(format!("failed to start update check: {e}"));
        }
        CheckOutcome::Accepted
    }

    /// Installs the downloaded release and restarts into it.
    pub async fn quit_and_install(&self) -> QuitOutcome {
        if !self.is_packaged() {
            return QuitOutcome::NotApplicable;
        }
        self.shared.install_now().await
    }

    /// Hands a downloaded, not yet applied release to the feed's install-after-exit entry.
    /// Only the first call after a download has any effect.
    pub fn install_on_exit(&self) -> bool {
        let Some(pending) = lock(&self.shared.downloaded).take() else {
            return false;
        };
        match self.shared.feed.apply_on_exit(&pending.release) {
            Ok(()) => {
                info!("Update {} will be applied after exit", pending.version);
                true
            }
            Err(e) => {
                warn!("Failed to schedule update {}: {e}", pending.version);
                false
            }
        }
    }
}

impl<F: ReleaseFeed> Shared<F> {
    async fn run_cycle(self: Arc<Self>) {
        let found = match self.blocking(|s| s.feed.check()).await {
            Ok(found) => found,
            Err(e) => {
                self.fail(e.to_string());
                return;
            }
        };

        let Some(AvailableRelease {
            version,
            total_bytes,
            release,
        }) = found
        else {
            info!("No update available");
            self.step(|s| s.no_update(), Some(UpdateEvent::no_update()));
            return;
        };

        if !self.step(
            |s| s.available(&version),
            Some(UpdateEvent::available(&version)),
        ) {
            return;
        }
        if !self.step(
            |s| s.downloading(UpdateProgress::from_percent(0, total_bytes)),
            None,
        ) {
            return;
        }

        info!("Downloading update {version}");
        let to_download = release.clone();
        let result = self
            .blocking(move |s| {
                let tracker = Mutex::new(ProgressTracker::new(total_bytes));
                s.feed
                    .download(&to_download, &|raw| s.report_progress(&tracker, raw))
            })
            .await;
        if let Err(e) = result {
            self.fail(e.to_string());
            return;
        }

        *lock(&self.downloaded) = Some(Downloaded {
            version: version.clone(),
            release,
        });
        if !self.step(|s| s.downloaded(), Some(UpdateEvent::downloaded(&version))) {
            return;
        }
        info!("Update {version} downloaded");

        match self.prompt.ask(&version).await {
            InstallChoice::Now => {
                let outcome = self.install_now().await;
                debug!("Install now finished with {outcome:?}");
            }
            InstallChoice::Later => info!("Update {version} deferred until exit"),
        }
    }

    async fn install_now(self: &Arc<Self>) -> QuitOutcome {
        let (version, release) = {
            let mut state = lock(&self.state);
            match state.phase() {
                UpdatePhase::Downloaded => {}
                UpdatePhase::InstallPending => return QuitOutcome::InProgress,
                _ => return QuitOutcome::NothingDownloaded,
            }
            let Some(pending) = lock(&self.downloaded)
                .as_ref()
                .map(|d| (d.version.clone(), d.release.clone()))
            else {
                return QuitOutcome::NothingDownloaded;
            };
            if let Err(e) = state.install_pending() {
                warn!("Cannot install update: {e}");
                return QuitOutcome::NothingDownloaded;
            }
            pending
        };

        info!("Installing update {version} and restarting");
        match self
            .blocking(move |s| s.feed.apply_and_restart(&release))
            .await
        {
            Ok(()) => {
                lock(&self.downloaded).take();
                QuitOutcome::Applied
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Install of {version} failed: {message}");
                let mut state = lock(&self.state);
                let _ = self.events.send(UpdateEvent::error(message.clone()));
                if let Err(e) = state.downloaded() {
                    warn!("{e}");
                }
                QuitOutcome::Failed(message)
            }
        }
    }

    fn report_progress(&self, tracker: &Mutex<ProgressTracker>, raw: i32) {
        let Some(progress) = lock(tracker).advance(raw) else {
            return;
        };
        self.step(
            |s| s.downloading(progress),
            Some(UpdateEvent::Progress(progress)),
        );
    }

    /// Applies a transition and publishes its event under one lock, so events leave in
    /// transition order. Returns false if the transition was rejected.
    fn step(
        &self,
        transition: impl FnOnce(&mut UpdateState) -> Result<(), InvalidTransition>,
        event: Option<UpdateEvent>,
    ) -> bool {
        let mut state = lock(&self.state);
        match transition(&mut state) {
            Ok(()) => {
                if let Some(event) = event {
                    let _ = self.events.send(event);
                }
                true
            }
            Err(e) => {
                warn!("Ignoring update transition: {e}");
                false
            }
        }
    }

    /// Reports a failed cycle and settles back to idle.
    fn fail(&self, message: String) {
        warn!("Update failed: {message}");
        let mut state = lock(&self.state);
        if let Err(e) = state.failed() {
            warn!("{e}");
        }
        let _ = self.events.send(UpdateEvent::error(message));
        if let Err(e) = state.settle() {
            debug!("{e}");
        }
    }

    async fn blocking<T, Op>(self: &Arc<Self>, op: Op) -> Result<T, UpdateError>
    where
        Op: FnOnce(&Self) -> Result<T, UpdateError> + Send + 'static,
        T: Send + 'static,
    {
        let shared = Arc::clone(self);
        tokio::task::spawn_blocking(move || op(&shared))
            .await
            .map_err(|e| UpdateError::Unavailable(format!("update worker stopped: {e}")))?
    }
}
