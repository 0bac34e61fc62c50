use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use filegate_core::models::AuditEntry;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditQuery {
    /// Maximum number of entries (1 to 1000, default from AUDIT_LOG_DEFAULT_LIMIT)
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/v0/audit",
    tag = "audit",
    params(AuditQuery),
    responses(
        (status = 200, description = "Audit entries, newest first", body = Vec<AuditEntry>),
        (status = 400, description = "Invalid limit", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_audit_entries(
    State(state): State<Arc<AppState>>,
    AuthContext(identity): AuthContext,
    Query(query): Query<AuditQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let entries = state.audit.list_recent(&identity, query.limit).await?;
    Ok(Json(entries))
}
