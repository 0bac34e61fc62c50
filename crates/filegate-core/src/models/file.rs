use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{TenantId, UserId};
use crate::AppError;

pub type FileId = i64;

/// Calendar dates during which an uploaded spreadsheet is considered valid.
/// Both ends are inclusive and `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidityWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl ValidityWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::InvalidInput(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Metadata for one uploaded spreadsheet.
///
/// `storage_key` is `None` while the upload is in progress; once set it always
/// points at a fully written blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FileRecord {
    pub id: FileId,
    pub filename: String,
    pub storage_key: Option<String>,
    pub size_bytes: i64,
    pub uploaded_by: UserId,
    pub tenant_id: TenantId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub uploaded_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn is_committed(&self) -> bool {
        self.storage_key.is_some()
    }
}

/// Metadata reserved before the blob is written
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub filename: String,
    pub size_bytes: i64,
    pub uploaded_by: UserId,
    pub tenant_id: TenantId,
    pub validity: ValidityWindow,
}

/// File metadata as returned to API callers. The storage key stays internal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileResponse {
    pub id: FileId,
    pub filename: String,
    pub size_bytes: i64,
    pub uploaded_by: UserId,
    pub client_id: TenantId,
    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2025-01-31")]
    pub end_date: NaiveDate,
    pub uploaded_at: DateTime<Utc>,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename,
            size_bytes: record.size_bytes,
            uploaded_by: record.uploaded_by,
            client_id: record.tenant_id,
            start_date: record.start_date,
            end_date: record.end_date,
            uploaded_at: record.uploaded_at,
        }
    }
}
