//! Error types raised by the JSON file storage implementation.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`FileStoreError`] failures.
pub type FileStoreResult<T> = Result<T, FileStoreError>;

/// Failures that can occur while reading or writing quiz documents.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The storage directory could not be created.
    #[error("failed to create storage directory `{path}`")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The storage directory is missing or not a directory.
    #[error("storage directory `{path}` is not accessible")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Reading a document or listing the directory failed.
    #[error("failed to read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Writing or renaming a document failed.
    #[error("failed to write `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Removing a document failed.
    #[error("failed to delete `{path}`")]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A document could not be encoded.
    #[error("failed to serialize quiz `{id}`")]
    Serialize {
        id: uuid::Uuid,
        #[source]
        source: serde_json::Error,
    },
    /// A document on disk does not decode into a quiz.
    #[error("failed to deserialize `{path}`")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<FileStoreError> for StorageError {
    fn from(err: FileStoreError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
