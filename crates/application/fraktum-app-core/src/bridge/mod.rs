//! The only surface the UI can reach. Every operation validates its input, delegates to
//! the store, the launcher or the update controller, and folds failures into a reply.

use std::path::Path;
use std::sync::Mutex;

use fraktum_config::{DEFAULT_BUILD_FILE, LATEST_BUILD_DIR, MAX_SAVE_BYTES};
use fraktum_core::{ConfigPatch, ExecutableInfo, LaunchRequest, SafeSegment, SlotId};
use fraktum_infra::launcher::{is_web_url, platform::platform_name};
use fraktum_infra::{download_to_file, DownloadEvent, ReleaseFeed};
use fraktum_persistence::{LauncherStore, StorageError, StorageErrorKind};
use tokio::sync::mpsc::Sender;
use tracing::{info, warn};

use crate::ports::{lock, Dialogs, LauncherPort};
use crate::remote::RemoteFacade;
use crate::updater::{CheckOutcome, QuitOutcome, UpdateController, UpdateEvents};

mod json;
pub mod wire;

pub use wire::{
    BridgeRequest, BuildDownloaded, DownloadBuildRequest, Done, Failure, GameLaunched, Reason,
    Reply, SaveExported, SaveStored, SaveUploadRequest, SlotRequest,
};

const DEV_BUILD_MESSAGE: &str = "Auto-update is only available in installed builds.";
const NOTHING_DOWNLOADED_MESSAGE: &str = "No update has been downloaded yet.";

pub struct CapabilityBridge<L: LauncherPort, D: Dialogs, F: ReleaseFeed> {
    store: LauncherStore,
    launcher: L,
    dialogs: D,
    updates: UpdateController<F>,
    events: Mutex<Option<UpdateEvents>>,
    remote: RemoteFacade,
    http: reqwest::Client,
    app_version: String,
}

impl<L: LauncherPort, D: Dialogs, F: ReleaseFeed> CapabilityBridge<L, D, F> {
    pub fn new(
        store: LauncherStore,
        launcher: L,
        dialogs: D,
        updates: UpdateController<F>,
        events: UpdateEvents,
    ) -> Self {
        Self {
            store,
            launcher,
            dialogs,
            updates,
            events: Mutex::new(Some(events)),
            remote: RemoteFacade::offline(),
            http: reqwest::Client::new(),
            app_version: fraktum_infra::updates::installed_version_string(),
        }
    }

    pub fn with_remote(mut self, remote: RemoteFacade) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    /// The update event stream. Handed out once; later calls return `None`.
    pub fn take_events(&self) -> Option<UpdateEvents> {
        lock(&self.events).take()
    }

    pub(crate) fn updates(&self) -> &UpdateController<F> {
        &self.updates
    }

    pub fn remote(&self) -> &RemoteFacade {
        &self.remote
    }

    /// Directory holding this profile's config, saves, builds and logs.
    pub fn profile_root(&self) -> &Path {
        self.store.paths().root()
    }

    /// False for development builds, which never check for updates.
    pub fn updates_enabled(&self) -> bool {
        self.updates.is_packaged()
    }

    // --- Executable ---

    /// Lets the user choose the game executable and remembers the choice.
    pub async fn select_executable(&self) -> Option<ExecutableInfo> {
        let path = self.dialogs.pick_executable().await?;
        let path = path.to_string_lossy().into_owned();

        let store = self.store.clone();
        let patch = ConfigPatch::exe_path(path.clone());
        match blocking(move || store.config().set(&patch)).await {
            Ok(_) => {
                info!("Selected executable {path}");
                Some(ExecutableInfo::from_path(&path))
            }
            Err(e) => {
                warn!("Failed to remember executable {path}: {e}");
                None
            }
        }
    }

    pub async fn get_executable(&self) -> Option<ExecutableInfo> {
        let store = self.store.clone();
        let config = blocking(move || Ok(store.config().get())).await.ok()?;
        config
            .exe_path
            .filter(|p| !p.trim().is_empty())
            .map(|p| ExecutableInfo::from_path(&p))
    }

    pub async fn run_game(&self, request: LaunchRequest) -> Reply<GameLaunched> {
        if let Err(e) = request.validate() {
            return Reply::Err(
                Failure::reason(Reason::ValidationFailure).with_message(e.to_string()),
            );
        }

        let Some(exe) = self.get_executable().await else {
            return Reply::Err(
                Failure::reason(Reason::NotConfigured)
                    .with_message("No game executable selected."),
            );
        };

        match self
            .launcher
            .launch_detached(Path::new(&exe.path), &request.args)
        {
            Ok(receipt) => {
                info!("Game {} started (pid {})", request.game_id, receipt.pid);
                let remote = self.remote.clone();
                let game_id = request.game_id.clone();
                if let Err(e) = crate::async_runtime::spawn(async move {
                    remote.start_play_session(&game_id).await;
                }) {
                    warn!("Could not record play session: {e}");
                }
                Reply::Ok(GameLaunched {
                    launched: true,
                    game_id: request.game_id,
                })
            }
            Err(e) => {
                warn!("Launch of {} failed: {e}", exe.path);
                Reply::Err(Failure::reason(e.kind().into()).with_message(e.to_string()))
            }
        }
    }

    // --- Saves ---

    pub async fn save_upload(&self, request: SaveUploadRequest) -> Reply<SaveStored> {
        let slot = match parse_target_slot(&request.slot) {
            Ok(slot) => slot,
            Err(failure) => return Reply::Err(failure),
        };
        if request.bytes.len() > MAX_SAVE_BYTES {
            return Reply::Err(save_too_large());
        }
        let SaveUploadRequest { name, bytes, .. } = request;
        self.store_save(slot, name, bytes).await
    }

    /// Asks for a save archive and stores its contents in `slot`.
    pub async fn save_import(&self, slot: &str) -> Reply<SaveStored> {
        let slot = match parse_target_slot(slot) {
            Ok(slot) => slot,
            Err(failure) => return Reply::Err(failure),
        };
        let Some(source) = self.dialogs.pick_save_source().await else {
            return Reply::Err(Failure::reason(Reason::Cancel));
        };

        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let read_from = source.clone();
        let bytes = match blocking(move || read_save_source(&read_from)).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Reply::Err(save_too_large()),
            Err(e) => {
                warn!("Could not read save {}: {e}", source.display());
                return Reply::Err(Failure::reason(Reason::IoFailure).with_error(e));
            }
        };
        self.store_save(slot, name, bytes).await
    }

    async fn store_save(
        &self,
        slot: SlotId,
        name: Option<String>,
        bytes: Vec<u8>,
    ) -> Reply<SaveStored> {
        let store = self.store.clone();
        match blocking(move || store.saves().upload(&slot, name.as_deref(), &bytes)).await {
            Ok(stored) => Reply::Ok(SaveStored {
                file: stored.file.to_string_lossy().into_owned(),
                name: stored.name,
            }),
            Err(e) => {
                warn!("Save upload failed: {e}");
                Reply::Err(Failure::reason(Reason::WriteFailed).with_error(e))
            }
        }
    }

    /// Asks where to put the slot's contents and copies it there.
    pub async fn save_download(&self, slot: &str) -> Reply<SaveExported> {
        let slot = match SlotId::parse(slot) {
            Ok(slot) => slot,
            Err(e) => return Reply::Err(Failure::reason(Reason::InvalidSlot).with_error(e)),
        };
        if !self.store.saves().contains(&slot) {
            return Reply::Err(Failure::reason(Reason::Empty));
        }

        let suggested = self
            .store
            .saves()
            .slot_path(&slot)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| slot.to_string());
        let Some(dest) = self.dialogs.pick_save_destination(&suggested).await else {
            return Reply::Err(Failure::reason(Reason::Cancel));
        };

        let store = self.store.clone();
        match blocking(move || store.saves().export(&slot, &dest)).await {
            Ok(file) => Reply::Ok(SaveExported {
                file_path: file.to_string_lossy().into_owned(),
            }),
            Err(e) if e.kind() == StorageErrorKind::Empty => {
                Reply::Err(Failure::reason(Reason::Empty))
            }
            Err(e) => {
                warn!("Save export failed: {e}");
                Reply::Err(Failure::reason(Reason::CopyFailed).with_error(e))
            }
        }
    }

    // --- Environment ---

    pub fn platform(&self) -> &'static str {
        platform_name()
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// Opens an http(s) URL in the system browser. Anything else is refused.
    pub fn open_external(&self, url: &str) -> bool {
        if !is_web_url(url) {
            warn!("Refusing to open {url:?}");
            return false;
        }
        match self.launcher.open_url(url) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to open {url}: {e}");
                false
            }
        }
    }

    // --- Updates ---

    pub fn update_check(&self) -> Reply<Done> {
        match self.updates.check_for_updates() {
            CheckOutcome::Accepted => Reply::Ok(Done {}),
            CheckOutcome::NotApplicable => {
                Reply::Err(Failure::dev().with_message(DEV_BUILD_MESSAGE))
            }
            CheckOutcome::Unavailable(reason) => Reply::Err(Failure::message(reason)),
        }
    }

    pub async fn update_quit_and_install(&self) -> Reply<Done> {
        match self.updates.quit_and_install().await {
            QuitOutcome::Applied | QuitOutcome::InProgress => Reply::Ok(Done {}),
            QuitOutcome::NotApplicable => Reply::Err(Failure::dev()),
            QuitOutcome::NothingDownloaded => {
                Reply::Err(Failure::message(NOTHING_DOWNLOADED_MESSAGE))
            }
            QuitOutcome::Failed(error) => Reply::Err(Failure::default().with_error(error)),
        }
    }

    // --- Game builds ---

    pub async fn download_game_build(
        &self,
        request: DownloadBuildRequest,
    ) -> Reply<BuildDownloaded> {
        self.download_game_build_with_progress(request, None).await
    }

    /// Downloads a game archive into `games/<gameId>/<version>/`. `exePath` is left alone.
    pub async fn download_game_build_with_progress(
        &self,
        request: DownloadBuildRequest,
        progress: Option<Sender<DownloadEvent>>,
    ) -> Reply<BuildDownloaded> {
        let target = match BuildTarget::parse(&request) {
            Ok(target) => target,
            Err(message) => {
                return Reply::Err(Failure::reason(Reason::ValidationFailure).with_message(message))
            }
        };

        let paths = self.store.paths().clone();
        let (game, version) = (target.game.clone(), target.version.clone());
        let dir = match blocking(move || paths.game_build_dir(&game, &version)).await {
            Ok(dir) => dir,
            Err(e) => {
                return Reply::Err(Failure::reason(Reason::IoFailure).with_message(e.to_string()))
            }
        };

        let dest = dir.join(&target.file_name);
        info!("Downloading build of {} to {}", target.game, dest.display());
        match download_to_file(&self.http, &request.url, &dest, progress).await {
            Ok(_) => Reply::Ok(BuildDownloaded {
                zip: dest.to_string_lossy().into_owned(),
                dir: dir.to_string_lossy().into_owned(),
            }),
            Err(e) => {
                warn!("Build download from {} failed: {e}", request.url);
                Reply::Err(Failure::reason(e.kind().into()).with_message(e.to_string()))
            }
        }
    }
}

fn parse_target_slot(slot: &str) -> Result<SlotId, Failure> {
    if slot.trim().is_empty() {
        return Err(Failure::reason(Reason::NoSlot));
    }
    SlotId::parse(slot).map_err(|e| Failure::reason(Reason::InvalidSlot).with_error(e))
}

fn save_too_large() -> Failure {
    Failure::reason(Reason::ValidationFailure)
        .with_message(format!("save is larger than {MAX_SAVE_BYTES} bytes"))
}

/// Reads a save archive chosen by the user. `None` when it is over the size limit.
fn read_save_source(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
    let len = std::fs::metadata(path)?.len();
    if len > MAX_SAVE_BYTES as u64 {
        return Ok(None);
    }
    Ok(Some(std::fs::read(path)?))
}

struct BuildTarget {
    game: SafeSegment,
    version: SafeSegment,
    file_name: String,
}

impl BuildTarget {
    fn parse(request: &DownloadBuildRequest) -> Result<Self, String> {
        let game = SafeSegment::parse(&request.game_id).map_err(|e| e.to_string())?;
        let version = match request.version.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => SafeSegment::parse(v).map_err(|e| e.to_string())?,
            _ => SafeSegment::parse(LATEST_BUILD_DIR).map_err(|e| e.to_string())?,
        };

        let url = reqwest::Url::parse(&request.url).map_err(|e| format!("invalid url: {e}"))?;
        if !is_allowed_build_url(&url) {
            return Err(format!("unsupported url: {}", request.url));
        }

        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| SafeSegment::parse(name).is_ok())
            .unwrap_or(DEFAULT_BUILD_FILE)
            .to_owned();

        Ok(Self {
            game,
            version,
            file_name,
        })
    }
}

/// `https` anywhere; plain `http` only to the local machine.
fn is_allowed_build_url(url: &reqwest::Url) -> bool {
    match url.scheme() {
        "https" => url.host_str().is_some(),
        "http" => matches!(
            url.host_str(),
            Some("127.0.0.1") | Some("localhost") | Some("[::1]")
        ),
        _ => false,
    }
}

async fn blocking<T, Op>(op: Op) -> Result<T, StorageError>
where
    Op: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e.to_string())))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(game: &str, url: &str, version: Option<&str>) -> DownloadBuildRequest {
        DownloadBuildRequest {
            game_id: game.into(),
            url: url.into(),
            version: version.map(Into::into),
        }
    }

    #[test]
    fn build_target_uses_url_file_name_and_latest() {
        let target =
            BuildTarget::parse(&request("novel", "https://cdn.example/b/Novel-win.zip?sig=1", None))
                .unwrap();
        assert_eq!(target.game.as_str(), "novel");
        assert_eq!(target.version.as_str(), LATEST_BUILD_DIR);
        assert_eq!(target.file_name, "Novel-win.zip");
    }

    #[test]
    fn build_target_falls_back_to_default_file_name() {
        let target =
            BuildTarget::parse(&request("novel", "https://cdn.example/", Some("1.2.0"))).unwrap();
        assert_eq!(target.version.as_str(), "1.2.0");
        assert_eq!(target.file_name, DEFAULT_BUILD_FILE);
    }

    #[test]
    fn build_target_rejects_traversal_and_plain_http() {
        assert!(BuildTarget::parse(&request("../etc", "https://cdn.example/a.zip", None)).is_err());
        assert!(
            BuildTarget::parse(&request("novel", "https://cdn.example/a.zip", Some("../1"))).is_err()
        );
        assert!(BuildTarget::parse(&request("novel", "http://cdn.example/a.zip", None)).is_err());
        assert!(BuildTarget::parse(&request("novel", "file:///etc/passwd", None)).is_err());
        assert!(BuildTarget::parse(&request("novel", "http://127.0.0.1:8080/a.zip", None)).is_ok());
    }
}
