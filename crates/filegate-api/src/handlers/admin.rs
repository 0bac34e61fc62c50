//! Admin-only tenant views

use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use filegate_core::authz::can_manage_tenants;
use filegate_core::models::{FileResponse, Tenant, TenantId};
use filegate_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/v0/admin/tenants",
    tag = "admin",
    responses(
        (status = 200, description = "All clients", body = Vec<Tenant>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_tenants(
    State(state): State<Arc<AppState>>,
    AuthContext(identity): AuthContext,
) -> Result<impl IntoResponse, HttpAppError> {
    if !can_manage_tenants(&identity) {
        return Err(AppError::Forbidden("Only administrators can list clients".to_string()).into());
    }
    let tenants = state.tenants.list().await?;
    Ok(Json(tenants))
}

#[utoipa::path(
    get,
    path = "/api/v0/admin/tenants/{id}/files",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Files of the client", body = Vec<FileResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn tenant_files(
    State(state): State<Arc<AppState>>,
    AuthContext(identity): AuthContext,
    Path(id): Path<TenantId>,
) -> Result<impl IntoResponse, HttpAppError> {
    let files = state.files.tenant_files(&identity, id).await?;
    Ok(Json(
        files.into_iter().map(FileResponse::from).collect::<Vec<_>>(),
    ))
}
