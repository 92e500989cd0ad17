//! Storage configuration types.

pub use localcloud_shared::config::StorageProvider;
use localcloud_shared::config::StorageSettings;

/// Storage backend configuration: one provider per storage class.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Provider backing the `internal` class.
    pub internal: StorageProvider,
    /// Provider backing the `external` class.
    pub external: StorageProvider,
    /// Bytes per download chunk (default: 64 KiB).
    pub chunk_size: usize,
}

impl StorageConfig {
    /// Default download chunk size: 64 KiB.
    pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

    /// Create a new storage config with the default chunk size.
    #[must_use]
    pub fn new(internal: StorageProvider, external: StorageProvider) -> Self {
        Self {
            internal,
            external,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }

    /// Two independent in-memory roots. Contents vanish with the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(StorageProvider::Memory, StorageProvider::Memory)
    }

    /// Set download chunk size. Zero is treated as one byte.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl From<&StorageSettings> for StorageConfig {
    fn from(settings: &StorageSettings) -> Self {
        Self::new(settings.internal.clone(), settings.external.clone())
            .with_chunk_size(settings.chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::new(
            StorageProvider::local_fs("./internal"),
            StorageProvider::local_fs("./external"),
        );
        assert_eq!(config.chunk_size, StorageConfig::DEFAULT_CHUNK_SIZE);
        assert_eq!(config.internal.name(), "local");
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let config = StorageConfig::in_memory().with_chunk_size(0);
        assert_eq!(config.chunk_size, 1);
    }

    #[test]
    fn test_from_settings() {
        let settings = StorageSettings {
            internal: StorageProvider::Memory,
            external: StorageProvider::local_fs("/srv/external"),
            chunk_size: 4096,
        };

        let config = StorageConfig::from(&settings);

        assert_eq!(config.internal, StorageProvider::Memory);
        assert_eq!(config.external, StorageProvider::local_fs("/srv/external"));
        assert_eq!(config.chunk_size, 4096);
    }
}
