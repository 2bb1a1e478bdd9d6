pub mod instance;
pub mod launcher;
pub mod net;
pub mod updates;

// Re-exports for convenience
pub use instance::{signal_running_instance, Acquired, FocusRequests, InstanceError, InstanceGuard};
pub use launcher::{LaunchError, LaunchReceipt, Launcher};
pub use net::{download_to_file, DownloadError, DownloadEvent};
pub use updates::{AvailableRelease, ReleaseFeed, UpdateError, VelopackFeed};
