//! Incremental blob writer and chunked blob reader.

use bytes::Bytes;
use futures::Stream;
use opendal::{Operator, Reader, Writer};
use tracing::warn;

use super::class::StorageClass;
use super::error::StorageError;

/// A blob whose bytes have been fully written and closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Class whose root holds the blob.
    pub storage_class: StorageClass,
    /// Relative, system-minted path under that root.
    pub stored_path: String,
    /// Number of bytes written.
    pub size: u64,
}

/// Writes one blob chunk by chunk.
///
/// The provider writer is opened on the first chunk. Dropping a `BlobWriter`
/// without calling [`finish`](Self::finish) or [`discard`](Self::discard)
/// leaves whatever was written in place.
pub struct BlobWriter {
    operator: Operator,
    storage_class: StorageClass,
    stored_path: String,
    writer: Option<Writer>,
    opened: bool,
    size: u64,
}

impl BlobWriter {
    pub(super) fn new(operator: Operator, storage_class: StorageClass, stored_path: String) -> Self {
        Self {
            operator,
            storage_class,
            stored_path,
            writer: None,
            opened: false,
            size: 0,
        }
    }

    /// The minted path this writer targets.
    #[must_use]
    pub fn stored_path(&self) -> &str {
        &self.stored_path
    }

    /// Bytes accepted so far.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Appends a chunk. Empty chunks are accepted and write nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the provider rejects the write. The
    /// writer is unusable afterwards and should be discarded.
    pub async fn write(&mut self, chunk: Bytes) -> Result<(), StorageError> {
        if chunk.is_empty() {
            return Ok(());
        }

        self.ensure_open().await?;
        let len = chunk.len() as u64;
        if let Some(writer) = self.writer.as_mut() {
            writer.write(chunk).await?;
        }
        self.size += len;
        Ok(())
    }

    /// Closes the blob and returns its location and size.
    ///
    /// A writer that never received a chunk produces a zero-byte blob.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the blob cannot be created or closed.
    /// The partial blob is removed best-effort before returning.
    pub async fn finish(mut self) -> Result<StoredBlob, StorageError> {
        let closed = match self.ensure_open().await {
            Ok(()) => match self.writer.as_mut() {
                Some(writer) => writer.close().await.map(|_| ()).map_err(StorageError::from),
                None => Ok(()),
            },
            Err(e) => Err(e),
        };

        if let Err(e) = closed {
            self.writer = None;
            self.discard().await;
            return Err(e);
        }

        Ok(StoredBlob {
            storage_class: self.storage_class,
            stored_path: self.stored_path,
            size: self.size,
        })
    }

    /// Aborts the write and deletes the partial blob.
    ///
    /// A writer that was never opened touches nothing. Failures are logged,
    /// never returned.
    pub async fn discard(mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.abort().await {
                warn!(
                    stored_path = %self.stored_path,
                    error = %e,
                    "Failed to abort partial blob write"
                );
            }
        }

        if !self.opened {
            return;
        }

        if let Err(e) = self.operator.delete(&self.stored_path).await {
            warn!(
                storage_class = %self.storage_class,
                stored_path = %self.stored_path,
                error = %e,
                "Failed to remove partial blob"
            );
        }
    }

    async fn ensure_open(&mut self) -> Result<(), StorageError> {
        if self.writer.is_none() {
            self.opened = true;
            let writer = self.operator.writer(&self.stored_path).await?;
            self.writer = Some(writer);
        }
        Ok(())
    }
}

impl std::fmt::Debug for BlobWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobWriter")
            .field("storage_class", &self.storage_class)
            .field("stored_path", &self.stored_path)
            .field("opened", &self.opened)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// An opened blob ready to be read in fixed-size chunks.
pub struct BlobReader {
    reader: Reader,
    size: u64,
}

impl BlobReader {
    pub(super) fn new(reader: Reader, size: u64) -> Self {
        Self { reader, size }
    }

    /// Total blob length in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Turns the handle into a lazy stream of chunks in file-offset order.
    ///
    /// Every chunk but the last is exactly `chunk_size` bytes. A zero-byte
    /// blob yields no chunks. Nothing is read until the stream is polled.
    pub fn into_chunks(
        self,
        chunk_size: usize,
    ) -> impl Stream<Item = Result<Bytes, StorageError>> + Send + 'static {
        let step = u64::try_from(chunk_size.max(1)).unwrap_or(u64::MAX);
        let state = (self.reader, 0_u64, self.size);

        futures::stream::try_unfold(state, move |(reader, offset, size)| {
            next_chunk(reader, offset, size, step)
        })
    }
}

type ReadState = (Reader, u64, u64);

async fn next_chunk(
    reader: Reader,
    offset: u64,
    size: u64,
    step: u64,
) -> Result<Option<(Bytes, ReadState)>, StorageError> {
    if offset >= size {
        return Ok(None);
    }

    let end = offset.saturating_add(step).min(size);
    let chunk = reader.read(offset..end).await?.to_bytes();
    if chunk.is_empty() {
        // blob shrank underneath us
        return Ok(None);
    }

    let next = offset + chunk.len() as u64;
    Ok(Some((chunk, (reader, next, size))))
}

impl std::fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobReader")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
