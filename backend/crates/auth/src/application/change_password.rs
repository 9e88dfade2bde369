//! Change Password Use Case
//!
//! The caller must prove the current password; the new one goes through the
//! storage policy.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    UserId,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> ChangePasswordUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, user_id: UserId, input: ChangePasswordInput) -> AuthResult<()> {
        let current = RawPassword::for_login(input.current_password)?;
        let new_password = RawPassword::new(input.new_password)?;

        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.password.verify(current, self.config.pepper.clone()).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let hashed = UserPassword::hash(new_password, self.config.pepper.clone()).await?;
        self.repo.update_password(user_id, &hashed).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}
