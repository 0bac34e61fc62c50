#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{Storage, StorageResult};
use filegate_core::Config;
use std::sync::Arc;

/// Create the storage backend described by the configuration
#[cfg(feature = "storage-local")]
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(config.storage_root()).await?;
    Ok(Arc::new(storage))
}

#[cfg(not(feature = "storage-local"))]
pub async fn create_storage(_config: &Config) -> StorageResult<Arc<dyn Storage>> {
    Err(crate::StorageError::ConfigError(
        "Local storage backend not available (storage-local feature not enabled)".to_string(),
    ))
}
