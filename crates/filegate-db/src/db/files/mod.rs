pub mod audit;
pub mod file;

pub use audit::{AuditRepositoryTrait, PostgresAuditRepository, MAX_AUDIT_PAGE};
pub use file::{FileFilter, FileRepositoryTrait, PostgresFileRepository};
