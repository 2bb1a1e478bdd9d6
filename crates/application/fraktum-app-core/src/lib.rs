mod async_runtime;
pub mod bridge;
pub mod host;
pub mod launcher;
pub mod ports;
pub mod remote;
pub mod updater;

pub use async_runtime::runtime;
pub use bridge::{
    BridgeRequest, BuildDownloaded, CapabilityBridge, DownloadBuildRequest, Done, Failure,
    GameLaunched, Reason, Reply, SaveExported, SaveStored, SaveUploadRequest,
    SlotRequest,
};
pub use host::{DesktopHost, HostOptions, LauncherHost};
pub use launcher::LauncherImpl;
pub use ports::*;
pub use remote::{
    FriendSummary, OfflineBackend, PlaySession, PlaytimeEntry, RemoteBackend, RemoteFacade,
};
pub use updater::{CheckOutcome, QuitOutcome, UpdateController, UpdateEvents};
