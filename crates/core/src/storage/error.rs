//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage class outside the closed enumeration.
    #[error("invalid storage class: '{value}'")]
    InvalidStorageClass {
        /// The rejected value.
        value: String,
    },

    /// Owner, logical path or stored path that cannot be placed under a root.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Blob not found under the resolved root.
    #[error("blob not found: {path}")]
    NotFound {
        /// Stored path that was not found.
        path: String,
    },

    /// Read, write or close failure in the underlying provider.
    #[error("storage I/O failed: {0}")]
    Io(String),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Create an invalid storage class error.
    #[must_use]
    pub fn invalid_storage_class(value: impl Into<String>) -> Self {
        Self::InvalidStorageClass {
            value: value.into(),
        }
    }

    /// Create an invalid path error.
    #[must_use]
    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an I/O error.
    #[must_use]
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                path: err.to_string(),
            },
            _ => Self::Io(err.to_string()),
        }
    }
}
