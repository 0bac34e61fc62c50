//! Audit recorder
//!
//! Appends run on a task tracker so the action that triggered them never waits
//! on, or fails because of, the audit log. `flush` drains in-flight appends.

use filegate_core::authz::can_view_audit_log;
use filegate_core::models::{AuditAction, AuditEntry, FileId, Identity, NewAuditEntry};
use filegate_core::AppError;
use filegate_db::AuditRepositoryTrait;
use std::sync::Arc;
use tokio_util::task::TaskTracker;

#[derive(Clone)]
pub struct AuditRecorder {
    repository: Arc<dyn AuditRepositoryTrait>,
    tracker: TaskTracker,
    default_limit: i64,
}

impl AuditRecorder {
    pub fn new(repository: Arc<dyn AuditRepositoryTrait>, default_limit: i64) -> Self {
        Self {
            repository,
            tracker: TaskTracker::new(),
            default_limit,
        }
    }

    /// Queue an entry for `identity` performing `action` on `file_id`.
    pub fn record(&self, identity: &Identity, action: AuditAction, file_id: FileId) {
        let entry = NewAuditEntry {
            actor_username: identity.username.clone(),
            action,
            file_id,
        };
        let repository = self.repository.clone();

        self.tracker.spawn(async move {
            if let Err(e) = repository.append(entry.clone()).await {
                tracing::error!(
                    error = %e,
                    user = %entry.actor_username,
                    action = %entry.action,
                    file_id = entry.file_id,
                    "Failed to append audit entry"
                );
            }
        });
    }

    /// Wait for every queued append to finish.
    pub async fn flush(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Newest entries first. `limit` falls back to the configured default and is
    /// capped by the repository.
    #[tracing::instrument(skip(self, identity), fields(user_id = identity.user_id))]
    pub async fn list_recent(
        &self,
        identity: &Identity,
        limit: Option<i64>,
    ) -> Result<Vec<AuditEntry>, AppError> {
        if !can_view_audit_log(identity) {
            return Err(AppError::Forbidden(
                "Only administrators can view the audit log".to_string(),
            ));
        }

        let limit = limit.unwrap_or(self.default_limit);
        if limit < 1 {
            return Err(AppError::InvalidInput(
                "limit must be at least 1".to_string(),
            ));
        }

        self.repository.list_recent(limit).await
    }
}
