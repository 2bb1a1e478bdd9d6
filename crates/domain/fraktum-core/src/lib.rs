pub mod config;
pub mod error;
pub mod launch;
pub mod names;
pub mod update;

pub use config::{ConfigPatch, LauncherConfig};
pub use error::{ErrorKind, ValidationError};
pub use launch::{ExecutableInfo, LaunchRequest};
pub use names::{ProfileName, SafeSegment, SlotId};
pub use update::{
    InvalidTransition, ProgressTracker, StatusPayload, StatusPhase, UpdateEvent, UpdatePhase,
    UpdateProgress, UpdateState,
};
