use filegate_core::{
    models::{AuditEntry, NewAuditEntry},
    AppError,
};
use sqlx::{PgPool, Postgres};

/// Hard upper bound on a single audit listing
pub const MAX_AUDIT_PAGE: i64 = 1000;

/// Append-only audit log storage
#[async_trait::async_trait]
pub trait AuditRepositoryTrait: Send + Sync {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, AppError>;

    /// Most recent entries first. `limit` is clamped to `1..=MAX_AUDIT_PAGE`.
    async fn list_recent(&self, limit: i64) -> Result<Vec<AuditEntry>, AppError>;
}

#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AuditRepositoryTrait for PostgresAuditRepository {
    #[tracing::instrument(skip(self, entry), fields(
        db.table = "audit_entries",
        db.operation = "insert",
        action = %entry.action,
        file_id = entry.file_id
    ))]
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, AppError> {
        let appended = sqlx::query_as::<Postgres, AuditEntry>(
            r#"
            INSERT INTO audit_entries (actor_username, action, file_id)
            VALUES ($1, $2, $3)
            RETURNING id, actor_username, action, file_id, created_at
            "#,
        )
        .bind(&entry.actor_username)
        .bind(entry.action)
        .bind(entry.file_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(appended)
    }

    #[tracing::instrument(skip(self), fields(db.table = "audit_entries", db.operation = "select"))]
    async fn list_recent(&self, limit: i64) -> Result<Vec<AuditEntry>, AppError> {
        let entries = sqlx::query_as::<Postgres, AuditEntry>(
            r#"
            SELECT id, actor_username, action, file_id, created_at
            FROM audit_entries
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit.clamp(1, MAX_AUDIT_PAGE))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
