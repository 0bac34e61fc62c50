//! Login and per-request authentication.

use filegate_core::models::Identity;
use filegate_core::AppError;

use super::credentials::CredentialStore;
use super::models::TokenResponse;
use super::token::TokenService;

#[derive(Clone)]
pub struct AuthService {
    credentials: CredentialStore,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(credentials: CredentialStore, tokens: TokenService) -> Self {
        Self {
            credentials,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, AppError> {
        let user = self.credentials.verify(username, password).await?;
        let issued = self.tokens.issue(&user)?;

        tracing::info!(user_id = user.id, role = %user.role, "User logged in");

        Ok(TokenResponse {
            access_token: issued.token,
            token_type: "bearer".to_string(),
            expires_in: issued.expires_in,
        })
    }

    /// Validate the token and resolve the caller from the credential store.
    /// Role and tenant always come from the stored user, never from the claims.
    #[tracing::instrument(skip_all)]
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AppError> {
        let claims = self.tokens.validate(token)?;

        let user = self
            .credentials
            .find(&claims.sub)
            .await?
            .ok_or_else(|| AppError::TokenInvalid("Token subject no longer exists".to_string()))?;

        // A recreated account with the same username must not inherit old tokens
        if user.id != claims.id {
            return Err(AppError::TokenInvalid(
                "Token subject does not match the current account".to_string(),
            ));
        }

        Identity::from_user(&user)
    }
}
