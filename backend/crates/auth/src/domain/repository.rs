//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//! There is deliberately no method that changes a user's role.

use chrono::{DateTime, Utc};

use crate::domain::entity::{NewUser, User};
use crate::domain::value_object::{UserId, email::Email, user_password::UserPassword};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert user + profile atomically, returning the assigned id
    async fn create(&self, user: &NewUser) -> AuthResult<UserId>;

    /// Find user by numeric id
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Find officer/developer by login email
    async fn find_by_officer_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Check if an officer email is taken
    async fn exists_by_officer_email(&self, email: &Email) -> AuthResult<bool>;

    /// Stamp a successful login
    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> AuthResult<()>;

    /// Replace the stored password hash
    async fn update_password(&self, user_id: UserId, password: &UserPassword) -> AuthResult<()>;
}
