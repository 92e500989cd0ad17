//! Transfer protocol errors.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors raised while driving an upload or download exchange.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A chunk arrived before the metadata message, or input ended without one.
    #[error("first message of an upload must carry file metadata")]
    MissingMetadata,

    /// A second metadata message arrived mid-exchange.
    #[error("metadata may only be sent once per upload")]
    DuplicateMetadata,

    /// A message that could not be decoded or is not valid in the current state.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The peer went away before signalling end-of-input.
    #[error("exchange cancelled: {0}")]
    Cancelled(String),

    /// Storage backend failure, propagated unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TransferError {
    /// Create a malformed message error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedMessage(msg.into())
    }

    /// Create a cancelled error.
    #[must_use]
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled(reason.into())
    }
}
