//! Gateway service: list, upload and download.

use std::pin::pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::{info, warn};

use super::error::FileError;
use super::types::{FileRecord, NewFileRecord};
use crate::access::{AccessPolicy, CallerIdentity, ListScope};
use crate::storage::{StorageBackend, StorageClass, StorageError};
use crate::transfer::{
    CompletedUpload, DownloadStream, Progress, TransferError, UploadExchange, UploadMessage,
    UploadTarget, download_stream,
};

/// Repository trait for file record persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait FileRepository: Send + Sync {
    /// Insert a new file record.
    fn insert(
        &self,
        record: NewFileRecord,
    ) -> impl std::future::Future<Output = Result<FileRecord, FileError>> + Send;

    /// Find a file record by ID.
    fn find_by_id(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<FileRecord>, FileError>> + Send;

    /// Check if a record with this ID exists.
    fn exists(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<bool, FileError>> + Send;

    /// List records matching a scope. Never called with `ListScope::Nothing`.
    fn list(
        &self,
        scope: &ListScope,
    ) -> impl std::future::Future<Output = Result<Vec<FileRecord>, FileError>> + Send;
}

/// Composes storage, transfer protocol, access policy and file records.
pub struct FileService<R: FileRepository> {
    storage: Arc<StorageBackend>,
    repo: Arc<R>,
}

impl<R: FileRepository> FileService<R> {
    /// Create a new file service.
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>, repo: Arc<R>) -> Self {
        Self { storage, repo }
    }

    /// Lists the records `caller` may see in `storage_class` under `path_prefix`.
    ///
    /// An anonymous caller gets an empty list without a repository query.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The storage class is not `internal` or `external`
    /// - The repository query fails
    pub async fn list(
        &self,
        caller: Option<&CallerIdentity>,
        storage_class: &str,
        path_prefix: &str,
    ) -> Result<Vec<FileRecord>, FileError> {
        let class = StorageClass::parse(storage_class)?;

        let scope = AccessPolicy::list_scope(caller, class, path_prefix);
        if scope.is_empty() {
            return Ok(Vec::new());
        }

        self.repo.list(&scope).await
    }

    /// Runs an upload exchange and records the file once its blob is closed.
    ///
    /// The stream ending is end-of-input; a transport that loses its peer
    /// must yield `TransferError::Cancelled` instead of ending. Returns the
    /// new file id.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The exchange violates the protocol (see [`UploadExchange`])
    /// - The caller may not upload for the metadata's owner
    /// - A record with the metadata's id already exists
    /// - Storage or the repository fails
    ///
    /// No record exists after any error except a failed insert, which leaves
    /// the closed blob behind as an orphan.
    pub async fn upload<S>(
        &self,
        caller: Option<&CallerIdentity>,
        messages: S,
    ) -> Result<String, FileError>
    where
        S: Stream<Item = Result<UploadMessage, TransferError>> + Send,
    {
        let mut exchange = UploadExchange::new(Arc::clone(&self.storage));
        let mut messages = pin!(messages);

        while let Some(next) = messages.next().await {
            let step = match next {
                Ok(message) => exchange.accept(message).await.map_err(FileError::from),
                Err(e) => Err(FileError::from(e)),
            };

            let admitted = match step {
                Ok(Progress::MetadataAccepted) => match exchange.target() {
                    Some(target) => self.admit(caller, target).await,
                    None => Err(TransferError::MissingMetadata.into()),
                },
                Ok(Progress::ChunkWritten(_)) => Ok(()),
                Err(e) => Err(e),
            };

            if let Err(e) = admitted {
                warn!(
                    file_id = exchange.target().map(|t| t.id.as_str()),
                    state = ?exchange.state(),
                    error = %e,
                    "Upload failed"
                );
                exchange.abort().await;
                return Err(e);
            }
        }

        let completed = exchange.finish().await?;
        self.record(completed).await
    }

    /// Opens `id` for download.
    ///
    /// The blob is opened before the stream is returned, so a missing blob
    /// fails here rather than mid-stream.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller is anonymous
    /// - No record exists, or it belongs to someone a restricted caller may not see
    /// - The blob is missing under the record's storage class
    pub async fn download(
        &self,
        caller: Option<&CallerIdentity>,
        id: &str,
    ) -> Result<DownloadStream, FileError> {
        let caller = caller.ok_or_else(|| FileError::unauthorized("authentication required"))?;

        let record = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| FileError::not_found(id))?;

        AccessPolicy::authorize_read(Some(caller), &record.owner_id)
            .map_err(|denied| FileError::denied(denied, id))?;

        let reader = self
            .storage
            .open(record.storage_class, &record.stored_path)
            .await
            .map_err(|e| match e {
                StorageError::NotFound { .. } => {
                    warn!(
                        file_id = %id,
                        stored_path = %record.stored_path,
                        "File record points at a missing blob"
                    );
                    FileError::not_found(id)
                }
                other => other.into(),
            })?;

        info!(
            file_id = %id,
            subject = %caller.subject,
            size = reader.size(),
            "Download started"
        );

        Ok(download_stream(reader, self.storage.chunk_size()))
    }

    /// Checks an upload's metadata before any bytes are written.
    async fn admit(
        &self,
        caller: Option<&CallerIdentity>,
        target: &UploadTarget,
    ) -> Result<(), FileError> {
        AccessPolicy::authorize_write(caller, &target.owner_id)
            .map_err(|denied| FileError::denied(denied, &target.id))?;

        if self.repo.exists(&target.id).await? {
            return Err(FileError::conflict(&target.id));
        }

        Ok(())
    }

    async fn record(&self, completed: CompletedUpload) -> Result<String, FileError> {
        let CompletedUpload { target, blob } = completed;
        let stored_path = blob.stored_path.clone();

        let new_record = NewFileRecord {
            id: target.id,
            owner_id: target.owner_id,
            storage_class: target.storage_class,
            logical_path: target.logical_path,
            stored_path: blob.stored_path,
            size: blob.size,
        };

        match self.repo.insert(new_record).await {
            Ok(record) => {
                info!(
                    file_id = %record.id,
                    owner_id = %record.owner_id,
                    storage_class = %record.storage_class,
                    size = record.size,
                    "File uploaded"
                );
                Ok(record.id)
            }
            Err(e) => {
                warn!(
                    storage_class = %blob.storage_class,
                    stored_path = %stored_path,
                    error = %e,
                    "File record insert failed, blob left orphaned"
                );
                Err(e)
            }
        }
    }
}
