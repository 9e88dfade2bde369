//! In-memory user repository
//!
//! Backs the use case and router tests. Ids are handed out sequentially
//! starting at 1, like the Postgres identity column.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entity::{NewUser, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{UserId, email::Email, user_password::UserPassword};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct State {
    next_id: i64,
    users: BTreeMap<UserId, User>,
}

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &NewUser) -> AuthResult<UserId> {
        let mut state = self.state.write().await;

        if let Some(email) = user.profile.officer_email() {
            let taken = state
                .users
                .values()
                .any(|u| u.profile.officer_email() == Some(email));
            if taken {
                return Err(AuthError::EmailTaken);
            }
        }

        state.next_id += 1;
        let user_id = UserId::new(state.next_id);
        let now = Utc::now();

        let stored = User::restore(
            user_id,
            user.user_name.clone(),
            user.role(),
            user.profile.clone(),
            user.profile_picture.clone(),
            user.password.clone(),
            None,
            now,
            now,
        )?;
        state.users.insert(user_id, stored);

        Ok(user_id)
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_by_officer_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.profile.officer_email() == Some(email))
            .cloned())
    }

    async fn exists_by_officer_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.find_by_officer_email(email).await?.is_some())
    }

    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> AuthResult<()> {
        if let Some(user) = self.state.write().await.users.get_mut(&user_id) {
            user.last_login_at = Some(at);
            user.updated_at = at;
        }
        Ok(())
    }

    async fn update_password(&self, user_id: UserId, password: &UserPassword) -> AuthResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(AuthError::UserNotFound)?;
        user.password = password.clone();
        user.updated_at = Utc::now();
        Ok(())
    }
}
