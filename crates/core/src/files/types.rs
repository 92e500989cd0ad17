//! File record types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::storage::StorageClass;

/// Metadata of one stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Caller-supplied id.
    pub id: String,
    /// Uploading owner.
    pub owner_id: String,
    /// Class whose root holds the blob.
    pub storage_class: StorageClass,
    /// Display and filter path.
    pub logical_path: String,
    /// System-minted blob location. Never shown to callers.
    pub stored_path: String,
    /// Content length in bytes.
    pub size: u64,
    /// When the upload completed.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a file record after its blob is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileRecord {
    /// File id.
    pub id: String,
    /// Owner id.
    pub owner_id: String,
    /// Storage class.
    pub storage_class: StorageClass,
    /// Logical path.
    pub logical_path: String,
    /// Stored path returned by the storage backend.
    pub stored_path: String,
    /// Bytes written.
    pub size: u64,
}

/// What callers get to see of a file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    /// File id.
    pub id: String,
    /// Owner id.
    pub owner_id: String,
    /// Storage class.
    pub storage_class: StorageClass,
    /// Logical path.
    pub logical_path: String,
    /// Size in bytes.
    pub size: u64,
    /// Upload completion time.
    pub created_at: DateTime<Utc>,
}

impl From<FileRecord> for FileSummary {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id,
            storage_class: record.storage_class,
            logical_path: record.logical_path,
            size: record.size,
            created_at: record.created_at,
        }
    }
}
