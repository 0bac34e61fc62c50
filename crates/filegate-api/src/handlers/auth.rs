use crate::auth::{AuthContext, LoginRequest, TokenResponse};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use filegate_core::models::IdentityResponse;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/v0/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token issued", body = TokenResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let token = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(token))
}

#[utoipa::path(
    get,
    path = "/api/v0/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Identity of the caller", body = IdentityResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(AuthContext(identity): AuthContext) -> Json<IdentityResponse> {
    Json(IdentityResponse::from(&identity))
}
