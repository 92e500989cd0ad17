//! Download read loop.

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;

use super::error::TransferError;
use crate::storage::BlobReader;

/// Lazy, finite, non-restartable sequence of content chunks.
pub type DownloadStream = BoxStream<'static, Result<Bytes, TransferError>>;

/// Streams an opened blob in `chunk_size` pieces, in file-offset order.
#[must_use]
pub fn download_stream(reader: BlobReader, chunk_size: usize) -> DownloadStream {
    reader
        .into_chunks(chunk_size)
        .map(|chunk| chunk.map_err(TransferError::from))
        .boxed()
}
