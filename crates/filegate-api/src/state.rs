//! Application state shared by all handlers.

use crate::auth::AuthService;
use crate::services::{AuditRecorder, FileService};
use filegate_db::TenantRepositoryTrait;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub files: FileService,
    pub audit: AuditRecorder,
    pub tenants: Arc<dyn TenantRepositoryTrait>,
}
