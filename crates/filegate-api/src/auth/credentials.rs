use filegate_core::models::User;
use filegate_core::password::{dummy_verify, verify_password};
use filegate_core::AppError;
use filegate_db::UserRepositoryTrait;
use std::sync::Arc;

/// Verifies username/password pairs against the user repository
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepositoryTrait>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepositoryTrait>) -> Self {
        Self { users }
    }

    /// Unknown user and wrong password are indistinguishable to the caller.
    #[tracing::instrument(skip(self, password))]
    pub async fn verify(&self, username: &str, password: &str) -> Result<User, AppError> {
        let user = self.users.get_by_username(username).await?;
        let password = password.to_string();

        let Some(user) = user else {
            tokio::task::spawn_blocking(move || dummy_verify(&password))
                .await
                .map_err(|e| AppError::Internal(format!("Password task failed: {}", e)))?;
            tracing::debug!("Login attempt for unknown user");
            return Err(AppError::InvalidCredentials);
        };

        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password task failed: {}", e)))??;

        if !matches {
            tracing::debug!(user_id = user.id, "Login attempt with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn find(&self, username: &str) -> Result<Option<User>, AppError> {
        self.users.get_by_username(username).await
    }
}
