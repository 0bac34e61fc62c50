use filegate_core::{
    models::{Tenant, TenantId},
    AppError,
};
use sqlx::{PgPool, Postgres};

use crate::db::{conflict_on_unique, transaction::TransactionGuard};

/// Tenant (client organization) records
#[async_trait::async_trait]
pub trait TenantRepositoryTrait: Send + Sync {
    async fn list(&self) -> Result<Vec<Tenant>, AppError>;

    async fn get(&self, id: TenantId) -> Result<Option<Tenant>, AppError>;

    async fn create(&self, name: &str) -> Result<Tenant, AppError>;

    /// Remove a tenant. Refuses with `Conflict` while any user or file still
    /// references it.
    async fn delete(&self, id: TenantId) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TenantRepositoryTrait for PostgresTenantRepository {
    #[tracing::instrument(skip(self), fields(db.table = "tenants", db.operation = "select"))]
    async fn list(&self) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<Postgres, Tenant>(
            "SELECT id, name, created_at FROM tenants ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tenants", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: TenantId) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<Postgres, Tenant>(
            "SELECT id, name, created_at FROM tenants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tenants", db.operation = "insert"))]
    async fn create(&self, name: &str) -> Result<Tenant, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Tenant name must not be empty".to_string()));
        }

        let tenant = sqlx::query_as::<Postgres, Tenant>(
            "INSERT INTO tenants (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Tenant '{}' already exists", name)))?;

        tracing::info!(tenant_id = tenant.id, "Tenant created");
        Ok(tenant)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tenants", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: TenantId) -> Result<(), AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let exists = sqlx::query_scalar::<Postgres, i64>(
            "SELECT id FROM tenants WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(tx.conn()?)
        .await?
        .is_some();

        if !exists {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("Tenant {} not found", id)));
        }

        let user_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE tenant_id = $1")
                .bind(id)
                .fetch_one(tx.conn()?)
                .await?;
        let file_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE tenant_id = $1")
                .bind(id)
                .fetch_one(tx.conn()?)
                .await?;

        if user_count > 0 || file_count > 0 {
            tx.rollback().await?;
            return Err(AppError::Conflict(format!(
                "Tenant {} still has {} users and {} files",
                id, user_count, file_count
            )));
        }

        sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(tx.conn()?)
            .await?;
        tx.commit().await?;

        tracing::info!(tenant_id = id, "Tenant deleted");
        Ok(())
    }
}
