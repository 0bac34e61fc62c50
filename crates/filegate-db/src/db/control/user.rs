use filegate_core::{
    models::{NewUser, User, UserId},
    AppError,
};
use sqlx::{PgPool, Postgres};

use crate::db::conflict_on_unique;

/// User records backing the credential store
#[async_trait::async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn get(&self, id: UserId) -> Result<Option<User>, AppError>;

    /// Insert a user. Fails with `Conflict` on a taken username and with
    /// `InvalidInput` when the tenant reference does not fit the role.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;
}

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, role, tenant_id, created_at";

#[async_trait::async_trait]
impl UserRepositoryTrait for PostgresUserRepository {
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: UserId) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, user), fields(db.table = "users", db.operation = "insert", username = %user.username))]
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        user.check_tenant_scope()?;

        if let Some(tenant_id) = user.tenant_id {
            let tenant_exists = sqlx::query_scalar::<Postgres, bool>(
                "SELECT EXISTS(SELECT 1 FROM tenants WHERE id = $1)",
            )
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

            if !tenant_exists {
                return Err(AppError::NotFound(format!("Tenant {} not found", tenant_id)));
            }
        }

        let created = sqlx::query_as::<Postgres, User>(&format!(
            r#"
            INSERT INTO users (username, password_hash, role, tenant_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, format!("Username '{}' is already taken", user.username))
        })?;

        tracing::info!(user_id = created.id, role = %created.role, "User created");
        Ok(created)
    }
}
