//! File registry persistence
//!
//! Records are written in two steps: [`FileRepositoryTrait::reserve`] inserts a
//! row without a storage key to obtain the id, and
//! [`FileRepositoryTrait::attach_locator`] sets the key once the blob exists.
//! Rows without a key are invisible to listings and lookups.

use filegate_core::{
    authz::FileScope,
    models::{FileId, FileRecord, NewFileRecord, TenantId},
    AppError,
};
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Store-side filter for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFilter {
    pub scope: FileScope,
    pub tenant_id: Option<TenantId>,
}

impl FileFilter {
    pub fn new(scope: FileScope) -> Self {
        Self {
            scope,
            tenant_id: None,
        }
    }

    pub fn with_tenant(mut self, tenant_id: Option<TenantId>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn matches(&self, record: &FileRecord) -> bool {
        record.is_committed()
            && self.scope.admits(record)
            && self.tenant_id.map_or(true, |t| record.tenant_id == t)
    }
}

#[async_trait::async_trait]
pub trait FileRepositoryTrait: Send + Sync {
    /// Insert a pending row and return it with its assigned id.
    async fn reserve(&self, record: NewFileRecord) -> Result<FileRecord, AppError>;

    /// Commit a pending row by recording where its blob lives.
    async fn attach_locator(&self, id: FileId, storage_key: &str) -> Result<FileRecord, AppError>;

    /// Committed record by id. Pending rows are reported as absent.
    async fn find(&self, id: FileId) -> Result<Option<FileRecord>, AppError>;

    async fn get(&self, id: FileId) -> Result<FileRecord, AppError> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))
    }

    /// Committed records matching the filter, id ascending.
    async fn list(&self, filter: &FileFilter) -> Result<Vec<FileRecord>, AppError>;

    /// Remove a row. Returns false when it did not exist.
    async fn delete(&self, id: FileId) -> Result<bool, AppError>;

    /// Undo a reservation. Only rows still without a storage key are removed.
    async fn rollback(&self, id: FileId) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PostgresFileRepository {
    pool: PgPool,
}

impl PostgresFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const FILE_COLUMNS: &str =
    "id, filename, storage_key, size_bytes, uploaded_by, tenant_id, start_date, end_date, uploaded_at";

#[async_trait::async_trait]
impl FileRepositoryTrait for PostgresFileRepository {
    #[tracing::instrument(skip(self, record), fields(db.table = "files", db.operation = "insert", tenant_id = record.tenant_id))]
    async fn reserve(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        let reserved = sqlx::query_as::<Postgres, FileRecord>(&format!(
            r#"
            INSERT INTO files (filename, size_bytes, uploaded_by, tenant_id, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(&record.filename)
        .bind(record.size_bytes)
        .bind(record.uploaded_by)
        .bind(record.tenant_id)
        .bind(record.validity.start())
        .bind(record.validity.end())
        .fetch_one(&self.pool)
        .await?;

        Ok(reserved)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update", db.record_id = %id))]
    async fn attach_locator(&self, id: FileId, storage_key: &str) -> Result<FileRecord, AppError> {
        sqlx::query_as::<Postgres, FileRecord>(&format!(
            "UPDATE files SET storage_key = $2 WHERE id = $1 RETURNING {}",
            FILE_COLUMNS
        ))
        .bind(id)
        .bind(storage_key)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    async fn find(&self, id: FileId) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileRecord>(&format!(
            "SELECT {} FROM files WHERE id = $1 AND storage_key IS NOT NULL",
            FILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn list(&self, filter: &FileFilter) -> Result<Vec<FileRecord>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM files WHERE storage_key IS NOT NULL",
            FILE_COLUMNS
        ));

        match filter.scope {
            FileScope::All => {}
            FileScope::Tenant(tenant_id) => {
                query.push(" AND tenant_id = ").push_bind(tenant_id);
            }
            FileScope::Uploader(user_id) => {
                query.push(" AND uploaded_by = ").push_bind(user_id);
            }
        }
        if let Some(tenant_id) = filter.tenant_id {
            query.push(" AND tenant_id = ").push_bind(tenant_id);
        }
        query.push(" ORDER BY id");

        let records = query
            .build_query_as::<FileRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: FileId) -> Result<bool, AppError> {
        let rows_affected = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete", db.record_id = %id))]
    async fn rollback(&self, id: FileId) -> Result<bool, AppError> {
        let rows_affected =
            sqlx::query("DELETE FROM files WHERE id = $1 AND storage_key IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(rows_affected > 0)
    }
}
