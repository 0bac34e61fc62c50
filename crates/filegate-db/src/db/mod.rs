//! Database repositories for data access layer
//!
//! control/ holds the credential store records (users, tenants); files/ holds
//! the file registry and the audit log.
//
// Users and tenants
pub mod control;
//
// File records and audit entries
pub mod files;
//
// Transaction utilities
pub mod transaction;
//
// In-memory implementations
#[cfg(feature = "memory")]
pub mod memory;

pub use control::{
    PostgresTenantRepository, PostgresUserRepository, TenantRepositoryTrait, UserRepositoryTrait,
};
pub use files::{
    AuditRepositoryTrait, FileFilter, FileRepositoryTrait, PostgresAuditRepository,
    PostgresFileRepository, MAX_AUDIT_PAGE,
};
#[cfg(feature = "memory")]
pub use memory::MemoryDatabase;

use filegate_core::AppError;

/// Map a unique-constraint violation onto `Conflict`, anything else onto a
/// plain database error.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> AppError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => AppError::Conflict(message.into()),
        _ => AppError::Database(err),
    }
}
