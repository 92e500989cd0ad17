//! Upload exchange messages.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::error::TransferError;
use crate::storage::StorageClass;

/// Longest accepted file id, in bytes.
pub const MAX_FILE_ID_LEN: usize = 255;

/// File metadata, as sent by the client in the first upload message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    /// Caller-chosen file id.
    pub id: String,
    /// Owner the file is uploaded for.
    pub owner_id: String,
    /// Raw storage class, validated on arrival.
    pub storage_class: String,
    /// Display and filter path.
    #[serde(default)]
    pub logical_path: String,
}

/// One inbound message of an upload exchange.
///
/// End-of-input is the end of the message stream itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadMessage {
    /// File metadata. Must come first, exactly once.
    Meta(FileMeta),
    /// Raw content bytes, applied in arrival order.
    Chunk(Bytes),
}

/// Metadata that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// File id.
    pub id: String,
    /// Owner id.
    pub owner_id: String,
    /// Parsed storage class.
    pub storage_class: StorageClass,
    /// Logical path, stored verbatim.
    pub logical_path: String,
}

impl TryFrom<FileMeta> for UploadTarget {
    type Error = TransferError;

    fn try_from(meta: FileMeta) -> Result<Self, Self::Error> {
        if meta.id.trim().is_empty() {
            return Err(TransferError::malformed("file id must not be empty"));
        }
        if meta.id.len() > MAX_FILE_ID_LEN {
            return Err(TransferError::malformed(format!(
                "file id exceeds {MAX_FILE_ID_LEN} bytes"
            )));
        }

        let storage_class = StorageClass::parse(&meta.storage_class)?;

        Ok(Self {
            id: meta.id,
            owner_id: meta.owner_id,
            storage_class,
            logical_path: meta.logical_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    fn meta(id: &str, class: &str) -> FileMeta {
        FileMeta {
            id: id.to_string(),
            owner_id: "alice".to_string(),
            storage_class: class.to_string(),
            logical_path: "docs/a.txt".to_string(),
        }
    }

    #[test]
    fn test_valid_meta() {
        let target = UploadTarget::try_from(meta("f1", "internal")).unwrap();
        assert_eq!(target.id, "f1");
        assert_eq!(target.storage_class, StorageClass::Internal);
    }

    #[test]
    fn test_empty_id_rejected() {
        let err = UploadTarget::try_from(meta("  ", "internal")).unwrap_err();
        assert!(matches!(err, TransferError::MalformedMessage(_)));
    }

    #[test]
    fn test_overlong_id_rejected() {
        let id = "x".repeat(MAX_FILE_ID_LEN + 1);
        let err = UploadTarget::try_from(meta(&id, "internal")).unwrap_err();
        assert!(matches!(err, TransferError::MalformedMessage(_)));
    }

    #[test]
    fn test_unknown_class_rejected() {
        let err = UploadTarget::try_from(meta("f1", "Internal")).unwrap_err();
        assert!(matches!(
            err,
            TransferError::Storage(StorageError::InvalidStorageClass { .. })
        ));
    }

    #[test]
    fn test_logical_path_defaults_to_empty() {
        let meta: FileMeta = serde_json::from_str(
            r#"{"id":"f1","owner_id":"alice","storage_class":"external"}"#,
        )
        .unwrap();
        assert_eq!(meta.logical_path, "");
    }
}
