//! Service wiring
//!
//! Repositories come in as trait objects so the same wiring serves Postgres in
//! production and the in-memory store in tests.

use crate::auth::{AuthService, CredentialStore, TokenService};
use crate::services::{AuditRecorder, FileService};
use crate::state::AppState;
use filegate_core::Config;
use filegate_db::{
    AuditRepositoryTrait, FileRepositoryTrait, PostgresAuditRepository, PostgresFileRepository,
    PostgresTenantRepository, PostgresUserRepository, TenantRepositoryTrait, UserRepositoryTrait,
};
use filegate_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepositoryTrait>,
    pub tenants: Arc<dyn TenantRepositoryTrait>,
    pub files: Arc<dyn FileRepositoryTrait>,
    pub audit: Arc<dyn AuditRepositoryTrait>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            tenants: Arc::new(PostgresTenantRepository::new(pool.clone())),
            files: Arc::new(PostgresFileRepository::new(pool.clone())),
            audit: Arc::new(PostgresAuditRepository::new(pool)),
        }
    }
}

pub fn build_state(
    config: &Config,
    repositories: Repositories,
    storage: Arc<dyn Storage>,
) -> Arc<AppState> {
    let tokens = TokenService::new(config.jwt_secret(), config.jwt_expiry_minutes());
    let auth = AuthService::new(CredentialStore::new(repositories.users), tokens);

    let audit = AuditRecorder::new(repositories.audit, config.audit_log_default_limit());

    let files = FileService::new(
        repositories.files,
        repositories.tenants.clone(),
        storage,
        audit.clone(),
        config.upload_policy(),
        config.storage_timeout(),
    );

    tracing::info!(
        max_upload_bytes = config.max_upload_size_bytes(),
        allowed_extensions = %config.allowed_extensions().join(","),
        token_lifetime_minutes = config.jwt_expiry_minutes(),
        "Services initialized"
    );

    Arc::new(AppState {
        auth,
        files,
        audit,
        tenants: repositories.tenants,
    })
}
