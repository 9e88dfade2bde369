//! Login Use Case
//!
//! Residents log in with their numeric user id, officers with their email.
//! Both flows answer "user not found" identically whether the identifier is
//! unknown or belongs to the other flow. A hash from an older algorithm is
//! replaced with Argon2id on the first successful login.

use std::sync::Arc;

use chrono::Utc;
use platform::token::TokenPair;

use crate::application::config::AuthConfig;
use crate::domain::entity::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    UserId,
    email::Email,
    user_password::{LoginCheck, RawPassword},
};
use crate::error::{AuthError, AuthResult};

/// Which identifier the caller presented
pub enum LoginIdentifier {
    Resident(UserId),
    Officer(String),
}

/// Login input
pub struct LoginInput {
    pub identifier: LoginIdentifier,
    pub password: String,
}

/// Login output
#[derive(Debug)]
pub struct LoginOutput {
    pub tokens: TokenPair,
    pub user: User,
}

/// Login use case
pub struct LoginUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> LoginUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        let password = RawPassword::for_login(input.password)?;

        let user = match input.identifier {
            LoginIdentifier::Resident(user_id) => self
                .repo
                .find_by_id(user_id)
                .await?
                .filter(|user| user.role().is_resident()),
            LoginIdentifier::Officer(email) => {
                // A malformed email can't belong to anyone
                let Ok(email) = Email::new(email) else {
                    return Err(AuthError::UserNotFound);
                };
                self.repo
                    .find_by_officer_email(&email)
                    .await?
                    .filter(User::is_staff)
            }
        };

        let user = user.ok_or(AuthError::UserNotFound)?;

        let check = user
            .password
            .verify_and_upgrade(password, self.config.pepper.clone())
            .await?;

        let upgraded = match check {
            LoginCheck::Mismatch => {
                tracing::info!(user_id = %user.user_id, "Password mismatch");
                return Err(AuthError::InvalidCredentials);
            }
            LoginCheck::Match { upgraded } => upgraded,
        };

        let mut user = user;
        if let Some(hashed) = upgraded {
            match self.repo.update_password(user.user_id, &hashed).await {
                Ok(()) => {
                    tracing::info!(user_id = %user.user_id, "Password hash upgraded to Argon2id");
                    user.password = hashed;
                }
                Err(e) => {
                    tracing::warn!(user_id = %user.user_id, error = %e, "Failed to upgrade password hash");
                }
            }
        }

        let tokens = self.config.tokens.issue_pair(user.user_id.get())?;

        let now = Utc::now();
        if let Err(e) = self.repo.record_login(user.user_id, now).await {
            tracing::warn!(user_id = %user.user_id, error = %e, "Failed to record last login");
        }

        user.last_login_at = Some(now);

        tracing::info!(user_id = %user.user_id, role = %user.role(), "User logged in");

        Ok(LoginOutput { tokens, user })
    }
}
