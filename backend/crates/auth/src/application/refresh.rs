//! Refresh Use Case
//!
//! Exchanges a refresh token for a new access token. The refresh token
//! itself is not rotated.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::UserId;
use crate::error::{AuthError, AuthResult};

/// Refresh use case
pub struct RefreshUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> RefreshUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<String> {
        let claims = self.config.tokens.verify_refresh_token(refresh_token)?;
        let user_id = UserId::new(claims.user_id);

        // Deleted users keep a signature-valid token until it expires
        if self.repo.find_by_id(user_id).await?.is_none() {
            tracing::warn!(user_id = %user_id, "Refresh token for unknown user");
            return Err(AuthError::InvalidToken);
        }

        let access_token = self.config.tokens.issue_access_token(user_id.get())?;
        tracing::debug!(user_id = %user_id, "Access token refreshed");
        Ok(access_token)
    }
}
