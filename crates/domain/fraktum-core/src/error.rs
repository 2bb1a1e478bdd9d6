use serde::{Deserialize, Serialize};

/// Failure classes shared by every component. The bridge reports these to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    NotConfigured,
    SpawnFailed,
    IoFailure,
    UpdaterUnavailable,
    NetworkFailure,
    ValidationFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotConfigured => "not-configured",
            ErrorKind::SpawnFailed => "spawn-failed",
            ErrorKind::IoFailure => "io-failure",
            ErrorKind::UpdaterUnavailable => "updater-unavailable",
            ErrorKind::NetworkFailure => "network-failure",
            ErrorKind::ValidationFailure => "validation-failure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} is longer than {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} contains characters outside [A-Za-z0-9_.-]: {value:?}")]
    UnsafeSegment { field: &'static str, value: String },
    #[error("{field} contains a control character")]
    ControlCharacter { field: &'static str },
    #[error("too many launch arguments ({count}, at most {max})")]
    TooManyArgs { count: usize, max: usize },
    #[error("payload is larger than {max} bytes")]
    PayloadTooLarge { max: usize },
    #[error("unsupported url: {0}")]
    UnsupportedUrl(String),
    #[error("malformed request: {0}")]
    Malformed(String),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ValidationFailure
    }
}
