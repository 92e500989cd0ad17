//! Storage backend using Apache OpenDAL.
//!
//! Each storage class is bound to one physical root. A root can be any of:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, MinIO
//! - Azure Blob Storage
//! - Local filesystem
//! - Process memory (tests, throwaway dev servers)
//!
//! # Layout
//!
//! ```text
//! <root for class>/<owner_id>/<directory of logical path>/<minted uuid>
//! ```
//!
//! The stored path returned to callers is always relative to the root and is
//! only ever resolved against the root of the class it was written under.

mod blob;
mod class;
mod config;
mod error;
mod service;

pub use blob::{BlobReader, BlobWriter, StoredBlob};
pub use class::StorageClass;
pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{StorageBackend, StorageRoot};
