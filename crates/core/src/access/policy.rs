//! Access decisions for list, download and upload.

use super::identity::CallerIdentity;
use crate::files::FileRecord;
use crate::storage::StorageClass;

/// Predicate a listing runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// Every owner's records in the class under the prefix.
    All {
        /// Storage class to list.
        storage_class: StorageClass,
        /// Exact, case-sensitive logical path prefix.
        path_prefix: String,
    },
    /// Only `owner_id`'s records in the class under the prefix.
    Owner {
        /// Owner whose records are visible.
        owner_id: String,
        /// Storage class to list.
        storage_class: StorageClass,
        /// Exact, case-sensitive logical path prefix.
        path_prefix: String,
    },
    /// Matches no record. No query should be issued.
    Nothing,
}

impl ListScope {
    /// Check if a record falls inside this scope.
    #[must_use]
    pub fn matches(&self, record: &FileRecord) -> bool {
        match self {
            Self::All {
                storage_class,
                path_prefix,
            } => {
                record.storage_class == *storage_class
                    && record.logical_path.starts_with(path_prefix.as_str())
            }
            Self::Owner {
                owner_id,
                storage_class,
                path_prefix,
            } => {
                record.owner_id == *owner_id
                    && record.storage_class == *storage_class
                    && record.logical_path.starts_with(path_prefix.as_str())
            }
            Self::Nothing => false,
        }
    }

    /// Check if this scope can match anything at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Nothing)
    }
}

/// Why an access decision went against the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// No verified identity.
    Unauthenticated,
    /// Identity present but not allowed to act for this owner.
    Forbidden,
    /// The record exists but must look like it does not.
    Hidden,
}

/// Access decisions. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    /// Scope for listing `storage_class` under `path_prefix`.
    #[must_use]
    pub fn list_scope(
        caller: Option<&CallerIdentity>,
        storage_class: StorageClass,
        path_prefix: &str,
    ) -> ListScope {
        let Some(caller) = caller else {
            return ListScope::Nothing;
        };

        if caller.role.is_admin() {
            ListScope::All {
                storage_class,
                path_prefix: path_prefix.to_string(),
            }
        } else {
            ListScope::Owner {
                owner_id: caller.subject.clone(),
                storage_class,
                path_prefix: path_prefix.to_string(),
            }
        }
    }

    /// May `caller` download a record owned by `owner_id`?
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without identity; `Hidden` for a restricted caller
    /// asking for someone else's record.
    pub fn authorize_read(
        caller: Option<&CallerIdentity>,
        owner_id: &str,
    ) -> Result<(), AccessDenied> {
        let caller = caller.ok_or(AccessDenied::Unauthenticated)?;
        if caller.role.is_admin() || caller.owns(owner_id) {
            Ok(())
        } else {
            Err(AccessDenied::Hidden)
        }
    }

    /// May `caller` upload a file owned by `owner_id`?
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without identity; `Forbidden` for a restricted
    /// caller uploading on behalf of someone else.
    pub fn authorize_write(
        caller: Option<&CallerIdentity>,
        owner_id: &str,
    ) -> Result<(), AccessDenied> {
        let caller = caller.ok_or(AccessDenied::Unauthenticated)?;
        if caller.role.is_admin() || caller.owns(owner_id) {
            Ok(())
        } else {
            Err(AccessDenied::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use chrono::Utc;
    use proptest::prelude::*;

    fn record(owner: &str, class: StorageClass, path: &str) -> FileRecord {
        FileRecord {
            id: format!("{owner}-{path}"),
            owner_id: owner.to_string(),
            storage_class: class,
            logical_path: path.to_string(),
            stored_path: format!("{owner}/blob"),
            size: 0,
            created_at: Utc::now(),
        }
    }

    fn alice() -> CallerIdentity {
        CallerIdentity::new("alice", Role::Restricted)
    }

    fn admin() -> CallerIdentity {
        CallerIdentity::new("root", Role::Admin)
    }

    #[test]
    fn test_anonymous_lists_nothing() {
        let scope = AccessPolicy::list_scope(None, StorageClass::Internal, "");
        assert_eq!(scope, ListScope::Nothing);
        assert!(scope.is_empty());
        assert!(!scope.matches(&record("alice", StorageClass::Internal, "a.txt")));
    }

    #[test]
    fn test_restricted_scope_is_owner_only() {
        let scope = AccessPolicy::list_scope(Some(&alice()), StorageClass::Internal, "docs");

        assert!(scope.matches(&record("alice", StorageClass::Internal, "docs/a.txt")));
        assert!(!scope.matches(&record("bob", StorageClass::Internal, "docs/a.txt")));
    }

    #[test]
    fn test_admin_scope_spans_owners() {
        let scope = AccessPolicy::list_scope(Some(&admin()), StorageClass::Internal, "docs");

        assert!(scope.matches(&record("alice", StorageClass::Internal, "docs/a.txt")));
        assert!(scope.matches(&record("bob", StorageClass::Internal, "docs/b.txt")));
        assert!(!scope.matches(&record("bob", StorageClass::External, "docs/b.txt")));
    }

    #[test]
    fn test_prefix_is_literal_and_case_sensitive() {
        let scope = AccessPolicy::list_scope(Some(&admin()), StorageClass::External, "Docs");
        assert!(!scope.matches(&record("alice", StorageClass::External, "docs/a.txt")));

        let scope = AccessPolicy::list_scope(Some(&admin()), StorageClass::External, "d%");
        assert!(!scope.matches(&record("alice", StorageClass::External, "docs/a.txt")));
        assert!(scope.matches(&record("alice", StorageClass::External, "d%/a.txt")));
    }

    #[test]
    fn test_read_decisions() {
        assert_eq!(
            AccessPolicy::authorize_read(None, "alice"),
            Err(AccessDenied::Unauthenticated)
        );
        assert_eq!(AccessPolicy::authorize_read(Some(&alice()), "alice"), Ok(()));
        assert_eq!(
            AccessPolicy::authorize_read(Some(&alice()), "bob"),
            Err(AccessDenied::Hidden)
        );
        assert_eq!(AccessPolicy::authorize_read(Some(&admin()), "bob"), Ok(()));
    }

    #[test]
    fn test_write_decisions() {
        assert_eq!(
            AccessPolicy::authorize_write(None, "alice"),
            Err(AccessDenied::Unauthenticated)
        );
        assert_eq!(AccessPolicy::authorize_write(Some(&alice()), "alice"), Ok(()));
        assert_eq!(
            AccessPolicy::authorize_write(Some(&alice()), "bob"),
            Err(AccessDenied::Forbidden)
        );
        assert_eq!(AccessPolicy::authorize_write(Some(&admin()), "bob"), Ok(()));
    }

    proptest! {
        #[test]
        fn prop_restricted_never_sees_other_owners(
            subject in "[a-z]{1,8}",
            owner in "[a-z]{1,8}",
            path in "[a-z/]{0,16}",
        ) {
            let caller = CallerIdentity::new(subject.clone(), Role::from_claim("user"));
            let scope = AccessPolicy::list_scope(Some(&caller), StorageClass::Internal, "");

            let visible = scope.matches(&record(&owner, StorageClass::Internal, &path));
            prop_assert_eq!(visible, subject == owner);
        }
    }
}
