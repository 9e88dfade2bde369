//! Register User Use Case
//!
//! Staff create accounts for residents and fellow officers. The role is
//! chosen here and never changes afterwards.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::application::config::AuthConfig;
use crate::domain::entity::{NewUser, ResidentProfile, UserProfile};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    UserId,
    email::Email,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterUserInput {
    pub user_name: String,
    pub role: UserRole,
    pub password: String,
    pub profile_picture: Option<String>,
    pub officer_email: Option<String>,
    pub batch_number: Option<i32>,
    pub date_of_admission: Option<NaiveDate>,
    pub date_of_birth: Option<NaiveDate>,
}

/// Register user use case
pub struct RegisterUserUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> RegisterUserUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, actor: UserRole, input: RegisterUserInput) -> AuthResult<UserId> {
        if !actor.is_staff() {
            return Err(AuthError::Forbidden);
        }

        let user_name = UserName::new(&input.user_name)?;
        let profile = Self::build_profile(&input)?;

        if let Some(email) = profile.officer_email() {
            if self.repo.exists_by_officer_email(email).await? {
                return Err(AuthError::EmailTaken);
            }
        }

        let raw_password = RawPassword::new(input.password)?;
        let password = UserPassword::hash(raw_password, self.config.pepper.clone()).await?;

        let new_user = NewUser::new(
            user_name,
            input.role,
            profile,
            input.profile_picture,
            password,
        )?;

        let user_id = self.repo.create(&new_user).await?;

        tracing::info!(
            user_id = %user_id,
            role = %new_user.role(),
            "User registered"
        );

        Ok(user_id)
    }

    fn build_profile(input: &RegisterUserInput) -> AuthResult<UserProfile> {
        if input.role.is_staff() {
            let email = input
                .officer_email
                .as_deref()
                .ok_or_else(|| AuthError::Validation("officerEmail is required".into()))?;
            return Ok(UserProfile::Officer {
                email: Email::new(email)?,
            });
        }

        let (Some(batch_number), Some(date_of_admission), Some(date_of_birth)) = (
            input.batch_number,
            input.date_of_admission,
            input.date_of_birth,
        ) else {
            return Err(AuthError::Validation(
                "batchNumber, dateOfAdmission and dateOfBirth are required for residents".into(),
            ));
        };

        if batch_number < 1 {
            return Err(AuthError::Validation("batchNumber must be positive".into()));
        }
        if date_of_birth >= date_of_admission {
            return Err(AuthError::Validation(
                "dateOfBirth must be before dateOfAdmission".into(),
            ));
        }

        Ok(UserProfile::Resident(ResidentProfile {
            batch_number,
            date_of_admission,
            date_of_birth,
        }))
    }
}
