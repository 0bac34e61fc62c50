use crate::auth::models::AuthContext;
use crate::constants::BEARER_PREFIX;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use filegate_core::AppError;
use std::sync::Arc;

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix(BEARER_PREFIX) else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    match state.auth.authenticate(token.trim()).await {
        Ok(identity) => {
            tracing::debug!(
                user_id = identity.user_id,
                role = %identity.role(),
                tenant_id = ?identity.tenant_id(),
                "Request authenticated"
            );
            request.extensions_mut().insert(AuthContext(identity));
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
