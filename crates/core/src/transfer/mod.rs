//! Chunked transfer protocol.
//!
//! Uploads are a message exchange:
//!
//! ```text
//! AwaitingMeta --meta--> ReceivingChunks --chunk*--> (end) Finalizing --> Done
//!       \                       \                          \
//!        +-----------------------+--------------------------+--> Failed
//! ```
//!
//! Downloads are a fixed-size read loop over an opened blob.

mod download;
mod error;
mod message;
mod upload;

pub use download::{DownloadStream, download_stream};
pub use error::TransferError;
pub use message::{FileMeta, MAX_FILE_ID_LEN, UploadMessage, UploadTarget};
pub use upload::{CompletedUpload, Progress, UploadExchange, UploadState};
