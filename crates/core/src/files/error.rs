//! Gateway error types.

use localcloud_shared::AppError;
use thiserror::Error;

use crate::access::AccessDenied;
use crate::storage::StorageError;
use crate::transfer::TransferError;

/// Errors from list, upload and download.
#[derive(Debug, Error)]
pub enum FileError {
    /// No such file, or one the caller may not know about.
    #[error("file not found: {0}")]
    NotFound(String),

    /// Missing identity, or identity not allowed to act.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A record with this id already exists.
    #[error("file already exists: {0}")]
    Conflict(String),

    /// Metadata store failure.
    #[error("repository error: {0}")]
    Repository(String),

    /// Upload protocol failure.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Storage backend failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl FileError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create an unauthorized error.
    #[must_use]
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a conflict error.
    #[must_use]
    pub fn conflict(id: impl Into<String>) -> Self {
        Self::Conflict(id.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Translate a denied access decision for file `id`.
    #[must_use]
    pub fn denied(denied: AccessDenied, id: &str) -> Self {
        match denied {
            AccessDenied::Unauthenticated => Self::unauthorized("authentication required"),
            AccessDenied::Forbidden => {
                Self::unauthorized(format!("not allowed to act on file '{id}'"))
            }
            AccessDenied::Hidden => Self::not_found(id),
        }
    }
}

fn storage_to_app(err: StorageError) -> AppError {
    match err {
        StorageError::InvalidStorageClass { .. } | StorageError::InvalidPath { .. } => {
            AppError::Validation(err.to_string())
        }
        StorageError::NotFound { .. } => AppError::NotFound(err.to_string()),
        StorageError::Io(_) | StorageError::Configuration(_) => {
            AppError::Internal(err.to_string())
        }
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound(id) => Self::NotFound(format!("file '{id}'")),
            FileError::Unauthorized(msg) => Self::Unauthorized(msg),
            FileError::Conflict(id) => Self::Conflict(format!("file '{id}' already exists")),
            FileError::Repository(msg) => Self::Database(msg),
            FileError::Transfer(TransferError::Storage(e)) | FileError::Storage(e) => {
                storage_to_app(e)
            }
            FileError::Transfer(
                e @ (TransferError::MissingMetadata
                | TransferError::DuplicateMetadata
                | TransferError::MalformedMessage(_)),
            ) => Self::Validation(e.to_string()),
            FileError::Transfer(e @ TransferError::Cancelled(_)) => Self::Internal(e.to_string()),
        }
    }
}
