//! The closed set of storage classes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Logical storage class selecting which physical root backs a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    /// Files kept on the private root.
    Internal,
    /// Files kept on the shareable root.
    External,
}

impl StorageClass {
    /// All storage classes.
    pub const ALL: [Self; 2] = [Self::Internal, Self::External];

    /// Parses a storage class. Matching is exact and case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidStorageClass` for anything but
    /// `"internal"` or `"external"`.
    pub fn parse(value: &str) -> Result<Self, StorageError> {
        match value {
            "internal" => Ok(Self::Internal),
            "external" => Ok(Self::External),
            other => Err(StorageError::invalid_storage_class(other)),
        }
    }

    /// Wire and database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageClass {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("internal", StorageClass::Internal)]
    #[case("external", StorageClass::External)]
    fn test_parse_known_classes(#[case] value: &str, #[case] expected: StorageClass) {
        assert_eq!(StorageClass::parse(value).unwrap(), expected);
        assert_eq!(expected.as_str(), value);
    }

    #[rstest]
    #[case("")]
    #[case("Internal")]
    #[case("EXTERNAL")]
    #[case(" internal")]
    #[case("archive")]
    fn test_parse_rejects_everything_else(#[case] value: &str) {
        let err = StorageClass::parse(value).unwrap_err();
        assert!(matches!(err, StorageError::InvalidStorageClass { .. }));
    }

    #[test]
    fn test_serde_uses_lowercase() {
        let json = serde_json::to_string(&StorageClass::External).unwrap();
        assert_eq!(json, "\"external\"");
    }

    proptest! {
        #[test]
        fn prop_only_enumerated_values_parse(value in "\\PC{0,12}") {
            let parsed = StorageClass::parse(&value);
            if value == "internal" || value == "external" {
                prop_assert!(parsed.is_ok());
            } else {
                let rejected = matches!(parsed, Err(StorageError::InvalidStorageClass { .. }));
                prop_assert!(rejected);
            }
        }
    }
}
