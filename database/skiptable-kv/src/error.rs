use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot i/o on {path:?} failed")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> SnapshotError {
        let path = path.into();
        move |source| SnapshotError::Io { path, source }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max level must be at least 1, got {0}")]
    MaxLevel(usize),
}

/// Errors surfaced through the [`Storage`](crate::Storage) adapter.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("key not found")]
    KeyNotFound,
}
