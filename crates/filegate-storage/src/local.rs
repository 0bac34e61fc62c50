use crate::keys::is_valid_key;
use crate::traits::{Storage, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem storage rooted at a single directory
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create the root directory if needed and return a store over it.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a key against the root. Keys with traversal segments are
    /// rejected, and an existing path must canonicalize inside the root so a
    /// symlink cannot lead out of it.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if !is_valid_key(storage_key) {
            return Err(StorageError::InvalidKey(format!(
                "Storage key '{}' is not a relative path",
                storage_key
            )));
        }

        let path = self.base_path.join(storage_key);

        if let Ok(canonical) = path.canonicalize() {
            let base_canonical = self.base_path.canonicalize().map_err(|e| {
                StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
            })?;
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Sibling path the blob is staged under before the rename
    fn temp_path_for(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("blob");
        path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4()))
    }

    async fn write_temp(temp_path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut file = fs::File::create(temp_path).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to create file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to write file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to sync file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();
        let temp_path = Self::temp_path_for(&path);

        let staged = match Self::write_temp(&temp_path, &data).await {
            Ok(()) => fs::rename(&temp_path, &path).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to move {} into place: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) => Err(e),
        };

        if let Err(e) = staged {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!(
                        path = %temp_path.display(),
                        error = %cleanup,
                        "Failed to remove staged blob"
                    );
                }
            }
            return Err(e);
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::ReadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            )),
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        fs::remove_file(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            )),
        })?;

        // the per-file directory is empty now; leave tenant directories alone
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir(parent).await;
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
