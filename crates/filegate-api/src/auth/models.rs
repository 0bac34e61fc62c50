use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use filegate_core::models::{Identity, TenantId, UserId, UserRole};
use filegate_core::AppError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// username
    pub sub: String,
    pub role: UserRole,
    pub id: UserId,
    /// tenant of employees and clients, null for admins
    pub client_id: Option<TenantId>,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(length(min = 1, max = 1024))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always "bearer"
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Identity resolved by the auth middleware for the current request
#[derive(Debug, Clone)]
pub struct AuthContext(pub Identity);

// Multipart handlers cannot combine with Extension, so read the request parts directly
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing authentication context".to_string(),
                ))
            })
    }
}
