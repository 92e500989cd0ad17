//! Gateway service for stored files.
//!
//! This module ties the storage backend, the transfer protocol and the
//! access policy to the metadata store:
//! - List records visible to a caller
//! - Upload through a chunked exchange, recording the file after its blob closes
//! - Download as a lazy chunk stream

mod error;
mod service;
mod types;

pub use error::FileError;
pub use service::{FileRepository, FileService};
pub use types::{FileRecord, FileSummary, NewFileRecord};
