//! Upload saga
//!
//! An upload touches two stores that cannot share a transaction: the metadata
//! row and the blob. [`FileUploadTransaction`] walks them in a fixed order and,
//! if a step fails, undoes the completed steps in reverse so no row is left
//! without a blob and no committed row points at a missing blob.

use bytes::Bytes;
use chrono::NaiveDate;
use filegate_core::models::{FileId, FileRecord, NewFileRecord, TenantId};
use filegate_core::AppError;
use filegate_db::FileRepositoryTrait;
use filegate_storage::{file_key, Storage, StorageError};
use std::time::Duration;

/// Upload as received from the caller, before validation
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub data: Bytes,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Target tenant; required for admins, optional for everyone else
    pub tenant_id: Option<TenantId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UploadPhase {
    Validated,
    Reserved { file_id: FileId },
    BlobWritten { file_id: FileId, storage_key: String },
    Committed,
}

pub struct FileUploadTransaction<'a> {
    files: &'a dyn FileRepositoryTrait,
    storage: &'a dyn Storage,
    storage_timeout: Duration,
    phase: UploadPhase,
}

impl<'a> FileUploadTransaction<'a> {
    /// Start from an already validated and authorized record.
    pub fn new(
        files: &'a dyn FileRepositoryTrait,
        storage: &'a dyn Storage,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            files,
            storage,
            storage_timeout,
            phase: UploadPhase::Validated,
        }
    }

    #[tracing::instrument(
        skip(self, record, data),
        fields(tenant_id = record.tenant_id, filename = %record.filename, size = data.len())
    )]
    pub async fn execute(mut self, record: NewFileRecord, data: Bytes) -> Result<FileRecord, AppError> {
        match self.advance(record, data).await {
            Ok(committed) => Ok(committed),
            Err(e) => {
                tracing::warn!(error = %e, phase = ?self.phase, "Upload failed, compensating");
                self.compensate().await;
                Err(if e.is_storage_failure() {
                    e
                } else {
                    AppError::Storage(e.to_string())
                })
            }
        }
    }

    async fn advance(&mut self, record: NewFileRecord, data: Bytes) -> Result<FileRecord, AppError> {
        let tenant_id = record.tenant_id;
        let filename = record.filename.clone();

        let reserved = self.files.reserve(record).await?;
        self.phase = UploadPhase::Reserved {
            file_id: reserved.id,
        };

        let storage_key = file_key(tenant_id, reserved.id, &filename);
        // A timed-out write may still land, so the key is tracked before the write
        self.phase = UploadPhase::BlobWritten {
            file_id: reserved.id,
            storage_key: storage_key.clone(),
        };
        match tokio::time::timeout(self.storage_timeout, self.storage.put(&storage_key, data)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(AppError::Storage(format!(
                    "Blob write timed out after {}s",
                    self.storage_timeout.as_secs()
                )))
            }
        }

        let committed = self.files.attach_locator(reserved.id, &storage_key).await?;
        self.phase = UploadPhase::Committed;

        tracing::info!(
            file_id = committed.id,
            storage_key = %storage_key,
            "Upload committed"
        );
        Ok(committed)
    }

    /// Undo completed steps in reverse. Failures here are logged, never raised.
    async fn compensate(&mut self) {
        let file_id = match &self.phase {
            UploadPhase::Validated | UploadPhase::Committed => return,
            UploadPhase::Reserved { file_id } => *file_id,
            UploadPhase::BlobWritten {
                file_id,
                storage_key,
            } => {
                match self.storage.delete(storage_key).await {
                    Ok(()) | Err(StorageError::NotFound(_)) => {}
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            storage_key = %storage_key,
                            "Failed to remove blob during upload rollback"
                        );
                    }
                }
                *file_id
            }
        };

        match self.files.rollback(file_id).await {
            Ok(true) => tracing::debug!(file_id, "Reserved file row rolled back"),
            Ok(false) => tracing::warn!(file_id, "Reserved file row was already gone"),
            Err(e) => tracing::error!(
                error = %e,
                file_id,
                "Failed to roll back reserved file row"
            ),
        }
        self.phase = UploadPhase::Validated;
    }
}
