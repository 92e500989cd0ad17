//! Upload exchange state machine.

use std::sync::Arc;

use tracing::debug;

use super::error::TransferError;
use super::message::{UploadMessage, UploadTarget};
use crate::storage::{BlobWriter, StorageBackend, StoredBlob};

/// Where an upload exchange currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// Waiting for the metadata message.
    AwaitingMeta,
    /// Metadata accepted; content chunks are being written.
    ReceivingChunks,
    /// End-of-input seen; the blob is being closed.
    Finalizing,
    /// Blob closed.
    Done,
    /// A protocol or I/O error ended the exchange.
    Failed,
}

/// What an accepted message did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Metadata validated; the caller may now run admission checks.
    MetadataAccepted,
    /// A chunk of this many bytes was written.
    ChunkWritten(usize),
}

/// A finished upload: validated metadata plus the closed blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedUpload {
    /// Validated metadata.
    pub target: UploadTarget,
    /// The closed blob.
    pub blob: StoredBlob,
}

/// Drives one upload: metadata first, then chunks, then end-of-input.
///
/// After any error the exchange is `Failed` and must be [`abort`](Self::abort)ed
/// to remove bytes already written.
#[derive(Debug)]
pub struct UploadExchange {
    storage: Arc<StorageBackend>,
    state: UploadState,
    target: Option<UploadTarget>,
    writer: Option<BlobWriter>,
}

impl UploadExchange {
    /// Starts an exchange in `AwaitingMeta`.
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>) -> Self {
        Self {
            storage,
            state: UploadState::AwaitingMeta,
            target: None,
            writer: None,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> UploadState {
        self.state
    }

    /// Validated metadata, once accepted.
    #[must_use]
    pub fn target(&self) -> Option<&UploadTarget> {
        self.target.as_ref()
    }

    /// Applies one inbound message.
    ///
    /// # Errors
    ///
    /// - `MissingMetadata` for a chunk before metadata
    /// - `DuplicateMetadata` for a second metadata message
    /// - `MalformedMessage` for invalid metadata or a message after the end
    /// - `Storage` for an invalid class, an unsafe path or a failed write
    pub async fn accept(&mut self, message: UploadMessage) -> Result<Progress, TransferError> {
        let result = self.apply(message).await;
        if result.is_err() {
            self.state = UploadState::Failed;
        }
        result
    }

    async fn apply(&mut self, message: UploadMessage) -> Result<Progress, TransferError> {
        match (self.state, message) {
            (UploadState::AwaitingMeta, UploadMessage::Meta(meta)) => {
                let target = UploadTarget::try_from(meta)?;
                let writer = self.storage.begin(
                    target.storage_class,
                    &target.owner_id,
                    &target.logical_path,
                )?;
                debug!(
                    file_id = %target.id,
                    owner_id = %target.owner_id,
                    storage_class = %target.storage_class,
                    "Upload metadata accepted"
                );

                self.target = Some(target);
                self.writer = Some(writer);
                self.state = UploadState::ReceivingChunks;
                Ok(Progress::MetadataAccepted)
            }
            (UploadState::AwaitingMeta, UploadMessage::Chunk(_)) => {
                Err(TransferError::MissingMetadata)
            }
            (UploadState::ReceivingChunks, UploadMessage::Meta(_)) => {
                Err(TransferError::DuplicateMetadata)
            }
            (UploadState::ReceivingChunks, UploadMessage::Chunk(chunk)) => {
                let len = chunk.len();
                match self.writer.as_mut() {
                    Some(writer) => writer.write(chunk).await?,
                    None => return Err(TransferError::MissingMetadata),
                }
                Ok(Progress::ChunkWritten(len))
            }
            (state, _) => Err(TransferError::malformed(format!(
                "no messages accepted in state {state:?}"
            ))),
        }
    }

    /// Handles end-of-input: closes the blob and returns it.
    ///
    /// Metadata with zero chunks produces a zero-byte blob.
    ///
    /// # Errors
    ///
    /// `MissingMetadata` if metadata never arrived; `Storage` if the close
    /// fails, in which case the partial blob has already been removed.
    pub async fn finish(mut self) -> Result<CompletedUpload, TransferError> {
        if self.state != UploadState::ReceivingChunks {
            let err = match self.state {
                UploadState::AwaitingMeta => TransferError::MissingMetadata,
                state => TransferError::malformed(format!("cannot finish in state {state:?}")),
            };
            self.abort().await;
            return Err(err);
        }

        self.state = UploadState::Finalizing;
        let (Some(target), Some(writer)) = (self.target.take(), self.writer.take()) else {
            return Err(TransferError::MissingMetadata);
        };

        let blob = writer.finish().await?;
        self.state = UploadState::Done;

        Ok(CompletedUpload { target, blob })
    }

    /// Marks the exchange failed and removes any bytes written, best-effort.
    pub async fn abort(mut self) {
        self.state = UploadState::Failed;
        if let Some(writer) = self.writer.take() {
            writer.discard().await;
        }
    }
}
