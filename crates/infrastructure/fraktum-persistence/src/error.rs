use fraktum_core::{ErrorKind, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no application data directory could be determined")]
    NoDataDir,
    #[error("save slot '{0}' is empty")]
    EmptySlot(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid path: {0}")]
    InvalidPath(#[from] ValidationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    Missing,
    Empty,
    InvalidPath,
    Io,
    Codec,
}

impl StorageError {
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            StorageError::NoDataDir => StorageErrorKind::Missing,
            StorageError::EmptySlot(_) => StorageErrorKind::Empty,
            StorageError::Io(_) => StorageErrorKind::Io,
            StorageError::Serde(_) => StorageErrorKind::Codec,
            StorageError::InvalidPath(_) => StorageErrorKind::InvalidPath,
        }
    }

    pub fn error_kind(&self) -> ErrorKind {
        match self.kind() {
            StorageErrorKind::InvalidPath => ErrorKind::ValidationFailure,
            _ => ErrorKind::IoFailure,
        }
    }
}
