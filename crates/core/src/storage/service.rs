//! Storage backend implementation using Apache OpenDAL.

use std::pin::pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use opendal::{Operator, services};
use tracing::{debug, warn};
use uuid::Uuid;

use super::blob::{BlobReader, BlobWriter, StoredBlob};
use super::class::StorageClass;
use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// One physical root, bound to a single storage class.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    class: StorageClass,
    provider: &'static str,
    operator: Operator,
}

impl StorageRoot {
    /// Class this root serves.
    #[must_use]
    pub const fn class(&self) -> StorageClass {
        self.class
    }

    /// Provider name for logs.
    #[must_use]
    pub const fn provider_name(&self) -> &'static str {
        self.provider
    }
}

/// Maps storage classes to physical roots and moves raw bytes in and out.
///
/// Knows nothing about file records or callers.
#[derive(Debug, Clone)]
pub struct StorageBackend {
    internal: StorageRoot,
    external: StorageRoot,
    chunk_size: usize,
}

impl StorageBackend {
    /// Create a new storage backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either storage provider cannot be initialized.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let internal = StorageRoot {
            class: StorageClass::Internal,
            provider: config.internal.name(),
            operator: Self::create_operator(&config.internal)?,
        };
        let external = StorageRoot {
            class: StorageClass::External,
            provider: config.external.name(),
            operator: Self::create_operator(&config.external)?,
        };

        Ok(Self {
            internal,
            external,
            chunk_size: config.chunk_size.max(1),
        })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
                root,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region)
                    .root(root);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
                root,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container)
                    .root(root);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok),
        }
    }

    /// Resolves a raw storage class to its root.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidStorageClass` for any value outside the
    /// enumeration, including case variants and the empty string.
    pub fn resolve_root(&self, storage_class: &str) -> Result<&StorageRoot, StorageError> {
        StorageClass::parse(storage_class).map(|class| self.root(class))
    }

    /// Root backing an already-parsed class.
    #[must_use]
    pub const fn root(&self, class: StorageClass) -> &StorageRoot {
        match class {
            StorageClass::Internal => &self.internal,
            StorageClass::External => &self.external,
        }
    }

    /// Configured download chunk size in bytes.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Starts a new blob for `owner_id` under the root for `class`.
    ///
    /// The key is `<owner>/<directory of logical_path>/<minted uuid>`; the
    /// last segment of `logical_path` is never used on disk. Nothing is
    /// written until the first chunk arrives.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` if the owner is not a single safe
    /// segment or the logical path climbs out with `..`.
    pub fn begin(
        &self,
        class: StorageClass,
        owner_id: &str,
        logical_path: &str,
    ) -> Result<BlobWriter, StorageError> {
        let stored_path = mint_stored_path(owner_id, logical_path)?;
        debug!(
            storage_class = %class,
            stored_path = %stored_path,
            "Minted stored path"
        );

        Ok(BlobWriter::new(
            self.root(class).operator.clone(),
            class,
            stored_path,
        ))
    }

    /// Writes a whole byte source as one new blob.
    ///
    /// # Errors
    ///
    /// Returns the first error from the source, a write, or the close. The
    /// partial blob is removed best-effort in every failure case.
    pub async fn store<S>(
        &self,
        class: StorageClass,
        owner_id: &str,
        logical_path: &str,
        source: S,
    ) -> Result<StoredBlob, StorageError>
    where
        S: Stream<Item = Result<Bytes, StorageError>>,
    {
        let mut writer = self.begin(class, owner_id, logical_path)?;
        let mut source = pin!(source);

        while let Some(next) = source.next().await {
            let written = match next {
                Ok(chunk) => writer.write(chunk).await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                writer.discard().await;
                return Err(e);
            }
        }

        writer.finish().await
    }

    /// Opens a stored blob for reading, only under the root for `class`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` for a stored path that could
    /// escape its root, `StorageError::NotFound` if no blob exists there.
    pub async fn open(
        &self,
        class: StorageClass,
        stored_path: &str,
    ) -> Result<BlobReader, StorageError> {
        validate_stored_path(stored_path)?;
        let operator = &self.root(class).operator;

        let meta = operator.stat(stored_path).await.map_err(|e| {
            if e.kind() == opendal::ErrorKind::NotFound {
                StorageError::not_found(stored_path)
            } else {
                StorageError::from(e)
            }
        })?;
        if meta.is_dir() {
            return Err(StorageError::not_found(stored_path));
        }

        let reader = operator.reader(stored_path).await?;
        Ok(BlobReader::new(reader, meta.content_length()))
    }

    /// Deletes a stored blob, logging instead of failing.
    pub async fn remove(&self, class: StorageClass, stored_path: &str) {
        if let Err(e) = validate_stored_path(stored_path) {
            warn!(stored_path = %stored_path, error = %e, "Refusing to remove blob");
            return;
        }

        if let Err(e) = self.root(class).operator.delete(stored_path).await {
            warn!(
                storage_class = %class,
                stored_path = %stored_path,
                error = %e,
                "Failed to remove blob"
            );
        }
    }

    /// Stored paths of every blob kept for `owner_id` under `class`.
    ///
    /// Used to find orphans: blobs no file record points at.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` for an unsafe owner, or
    /// `StorageError::Io` if the listing fails.
    pub async fn stored_paths(
        &self,
        class: StorageClass,
        owner_id: &str,
    ) -> Result<Vec<String>, StorageError> {
        if !is_safe_segment(owner_id) {
            return Err(StorageError::invalid_path(
                owner_id,
                "owner must be a single path segment",
            ));
        }

        let entries = match self
            .root(class)
            .operator
            .list_with(&format!("{owner_id}/"))
            .recursive(true)
            .await
        {
            Ok(entries) => entries,
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(entries
            .into_iter()
            .filter(|entry| entry.metadata().is_file())
            .map(|entry| entry.path().to_string())
            .collect())
    }

    /// Check if a blob exists under the root for `class`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` for an unsafe stored path and
    /// `StorageError::Io` if the provider cannot answer.
    pub async fn exists(
        &self,
        class: StorageClass,
        stored_path: &str,
    ) -> Result<bool, StorageError> {
        validate_stored_path(stored_path)?;
        Ok(self.root(class).operator.exists(stored_path).await?)
    }
}

/// Builds `<owner>/<dirs>/<uuid>` from caller input.
fn mint_stored_path(owner_id: &str, logical_path: &str) -> Result<String, StorageError> {
    if !is_safe_segment(owner_id) {
        return Err(StorageError::invalid_path(
            owner_id,
            "owner must be a single path segment",
        ));
    }

    let minted = Uuid::new_v4().to_string();
    let mut segments = vec![owner_id];
    let mut parts: Vec<&str> = logical_path.split('/').collect();
    parts.pop(); // file name

    for part in parts {
        match part {
            "" | "." => {}
            ".." => {
                return Err(StorageError::invalid_path(
                    logical_path,
                    "parent segments are not allowed",
                ));
            }
            p if p.contains('\\') => {
                return Err(StorageError::invalid_path(
                    logical_path,
                    "backslashes are not allowed",
                ));
            }
            p if !is_safe_segment(p) => {
                return Err(StorageError::invalid_path(
                    logical_path,
                    "directory segment contains a NUL byte",
                ));
            }
            p => segments.push(p),
        }
    }

    segments.push(&minted);
    Ok(segments.join("/"))
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains('/')
        && !segment.contains('\\')
        && !segment.contains('\0')
}

/// Rejects stored paths that could resolve outside their root.
fn validate_stored_path(stored_path: &str) -> Result<(), StorageError> {
    if stored_path.starts_with('/') {
        return Err(StorageError::invalid_path(stored_path, "must be relative"));
    }
    if stored_path.contains('\\') {
        return Err(StorageError::invalid_path(
            stored_path,
            "backslashes are not allowed",
        ));
    }

    let mut count = 0;
    for segment in stored_path.split('/') {
        if !is_safe_segment(segment) {
            return Err(StorageError::invalid_path(
                stored_path,
                "segment is empty, '.', '..' or contains a NUL byte",
            ));
        }
        count += 1;
    }

    if count < 2 {
        return Err(StorageError::invalid_path(
            stored_path,
            "must contain an owner and a blob segment",
        ));
    }
    Ok(())
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use rstest::rstest;

    fn backend() -> StorageBackend {
        StorageBackend::from_config(&StorageConfig::in_memory().with_chunk_size(4))
            .expect("memory backend")
    }

    fn source(chunks: &[&'static str]) -> impl Stream<Item = Result<Bytes, StorageError>> {
        futures::stream::iter(
            chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    async fn read_all(backend: &StorageBackend, class: StorageClass, path: &str) -> Vec<u8> {
        let reader = backend.open(class, path).await.expect("open");
        let chunks: Vec<Bytes> = reader
            .into_chunks(backend.chunk_size())
            .try_collect()
            .await
            .expect("read");
        chunks.concat()
    }

    #[test]
    fn test_resolve_root() {
        let backend = backend();
        assert_eq!(
            backend.resolve_root("internal").unwrap().class(),
            StorageClass::Internal
        );
        assert_eq!(
            backend.resolve_root("external").unwrap().class(),
            StorageClass::External
        );
        assert_eq!(backend.root(StorageClass::External).provider_name(), "memory");
    }

    #[rstest]
    #[case("")]
    #[case("Internal")]
    #[case("public")]
    fn test_resolve_root_fails_closed(#[case] class: &str) {
        let err = backend().resolve_root(class).unwrap_err();
        assert!(matches!(err, StorageError::InvalidStorageClass { .. }));
    }

    #[test]
    fn test_mint_stored_path_layout() {
        let path = mint_stored_path("alice", "docs/reports/a.txt").unwrap();
        let parts: Vec<&str> = path.split('/').collect();

        assert_eq!(parts.len(), 4);
        assert_eq!(&parts[..3], &["alice", "docs", "reports"]);
        assert!(Uuid::parse_str(parts[3]).is_ok());
        assert!(!path.contains("a.txt"));
    }

    #[rstest]
    #[case("alice", "")]
    #[case("alice", "a.txt")]
    #[case("alice", "./docs//a.txt")]
    #[case("alice", "a b/ünï/c.txt")]
    #[case("alice", "do\0cs")]
    fn test_minted_paths_pass_open_validation(#[case] owner: &str, #[case] logical: &str) {
        let path = mint_stored_path(owner, logical).unwrap();
        assert!(validate_stored_path(&path).is_ok());
    }

    #[test]
    fn test_mint_stored_path_drops_empty_and_dot_segments() {
        let path = mint_stored_path("alice", "./docs//a.txt").unwrap();
        let parts: Vec<&str> = path.split('/').collect();
        assert_eq!(&parts[..2], &["alice", "docs"]);
        assert_eq!(parts.len(), 3);

        let path = mint_stored_path("alice", "a.txt").unwrap();
        assert_eq!(path.split('/').count(), 2);
    }

    #[test]
    fn test_mint_stored_path_is_unique_per_call() {
        let a = mint_stored_path("alice", "docs/a.txt").unwrap();
        let b = mint_stored_path("alice", "docs/a.txt").unwrap();
        assert_ne!(a, b);
    }

    #[rstest]
    #[case("", "a.txt")]
    #[case("..", "a.txt")]
    #[case("al/ice", "a.txt")]
    #[case("al\\ice", "a.txt")]
    #[case("alice", "../a.txt")]
    #[case("alice", "docs/../../a.txt")]
    #[case("alice", "docs\\x/a.txt")]
    #[case("alice", "do\0cs/a.txt")]
    fn test_mint_stored_path_rejects_unsafe_input(#[case] owner: &str, #[case] logical: &str) {
        let err = mint_stored_path(owner, logical).unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath { .. }));
    }

    #[rstest]
    #[case("/alice/blob")]
    #[case("alice")]
    #[case("alice/../bob/blob")]
    #[case("alice/./blob")]
    #[case("alice//blob")]
    #[case("alice\\blob")]
    #[case("")]
    fn test_validate_stored_path_rejects(#[case] path: &str) {
        assert!(matches!(
            validate_stored_path(path),
            Err(StorageError::InvalidPath { .. })
        ));
    }

    #[tokio::test]
    async fn test_store_and_open_round_trip() {
        let backend = backend();

        let blob = backend
            .store(
                StorageClass::Internal,
                "alice",
                "docs/a.txt",
                source(&["hello", " ", "world"]),
            )
            .await
            .unwrap();

        assert_eq!(blob.size, 11);
        assert!(blob.stored_path.starts_with("alice/docs/"));
        assert_eq!(
            read_all(&backend, StorageClass::Internal, &blob.stored_path).await,
            b"hello world"
        );
    }

    #[tokio::test]
    async fn test_download_chunks_are_fixed_size() {
        let backend = backend();
        let blob = backend
            .store(StorageClass::Internal, "alice", "a.bin", source(&["0123456789"]))
            .await
            .unwrap();

        let reader = backend
            .open(StorageClass::Internal, &blob.stored_path)
            .await
            .unwrap();
        assert_eq!(reader.size(), 10);

        let chunks: Vec<Bytes> = reader.into_chunks(4).try_collect().await.unwrap();
        let lens: Vec<usize> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(lens, vec![4, 4, 2]);
    }

    #[tokio::test]
    async fn test_empty_source_stores_zero_byte_blob() {
        let backend = backend();
        let blob = backend
            .store(StorageClass::External, "alice", "empty.txt", source(&[]))
            .await
            .unwrap();

        assert_eq!(blob.size, 0);
        assert!(backend.exists(StorageClass::External, &blob.stored_path).await.unwrap());
        assert!(read_all(&backend, StorageClass::External, &blob.stored_path)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_same_logical_path_gets_distinct_blobs() {
        let backend = backend();
        let first = backend
            .store(StorageClass::Internal, "alice", "docs/a.txt", source(&["one"]))
            .await
            .unwrap();
        let second = backend
            .store(StorageClass::Internal, "alice", "docs/a.txt", source(&["two"]))
            .await
            .unwrap();

        assert_ne!(first.stored_path, second.stored_path);
        assert_eq!(
            read_all(&backend, StorageClass::Internal, &first.stored_path).await,
            b"one"
        );
        assert_eq!(
            read_all(&backend, StorageClass::Internal, &second.stored_path).await,
            b"two"
        );
    }

    #[tokio::test]
    async fn test_open_from_other_class_is_not_found() {
        let backend = backend();
        let blob = backend
            .store(StorageClass::Internal, "alice", "a.txt", source(&["secret"]))
            .await
            .unwrap();

        let err = backend
            .open(StorageClass::External, &blob.stored_path)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_open_rejects_traversal() {
        let err = backend()
            .open(StorageClass::Internal, "alice/../../etc/passwd")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath { .. }));
    }

    #[tokio::test]
    async fn test_open_missing_blob() {
        let err = backend()
            .open(StorageClass::Internal, "alice/does-not-exist")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failing_source_leaves_no_blob() {
        let backend = backend();
        let failing = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(StorageError::io("connection reset")),
        ]);

        let err = backend
            .store(StorageClass::Internal, "alice", "a.txt", failing)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));

        let remaining = backend
            .stored_paths(StorageClass::Internal, "alice")
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_discard_removes_partial_blob() {
        let backend = backend();
        let mut writer = backend
            .begin(StorageClass::Internal, "alice", "a.txt")
            .unwrap();
        writer.write(Bytes::from_static(b"abc")).await.unwrap();
        let path = writer.stored_path().to_string();

        writer.discard().await;

        assert!(!backend.exists(StorageClass::Internal, &path).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_deletes_blob() {
        let backend = backend();
        let blob = backend
            .store(StorageClass::External, "bob", "x/y.txt", source(&["data"]))
            .await
            .unwrap();

        assert_eq!(
            backend.stored_paths(StorageClass::External, "bob").await.unwrap(),
            vec![blob.stored_path.clone()]
        );

        backend.remove(StorageClass::External, &blob.stored_path).await;

        assert!(!backend.exists(StorageClass::External, &blob.stored_path).await.unwrap());
        assert!(backend
            .stored_paths(StorageClass::External, "bob")
            .await
            .unwrap()
            .is_empty());
    }
}
