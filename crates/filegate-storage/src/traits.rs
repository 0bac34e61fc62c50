//! Storage abstraction trait

use async_trait::async_trait;
use bytes::Bytes;
use filegate_core::AppError;
use std::fmt;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// Blob store
///
/// Keys follow the layout in the crate documentation. A `put` is all or
/// nothing: readers never observe a partially written blob.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `key`, replacing any existing blob.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Remove the blob. Reports `NotFound` when nothing was stored under `key`.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    fn backend_type(&self) -> StorageBackend;
}
