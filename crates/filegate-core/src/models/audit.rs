use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

use super::FileId;

pub type AuditEntryId = i64;

/// Actions that leave a trace in the audit log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "audit_action", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Upload,
    Download,
    Delete,
}

impl Display for AuditAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AuditAction::Upload => write!(f, "upload"),
            AuditAction::Download => write!(f, "download"),
            AuditAction::Delete => write!(f, "delete"),
        }
    }
}

/// Immutable record of one authorized action. The actor is stored by username
/// so the entry stays readable after the user is removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditEntry {
    pub id: AuditEntryId,
    #[serde(rename = "user")]
    pub actor_username: String,
    pub action: AuditAction,
    pub file_id: FileId,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub actor_username: String,
    pub action: AuditAction,
    pub file_id: FileId,
}
