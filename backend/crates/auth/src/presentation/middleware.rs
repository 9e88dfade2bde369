//! Auth Middleware
//!
//! Bearer-token authentication for protected routes. Downstream handlers read
//! the caller through the [`AuthenticatedUser`] extractor.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use platform::cookie::extract_bearer_token;

use crate::domain::repository::UserRepository;
use crate::domain::value_object::{UserId, user_role::UserRole};
use crate::error::{AuthError, AuthResult};
use crate::presentation::handlers::AuthAppState;

/// Caller identity stored in request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Staff may act on anyone; everyone else only on themselves
    pub fn can_access(&self, user_id: UserId) -> bool {
        self.is_staff() || self.user_id == user_id
    }

    pub fn require_staff(&self) -> AuthResult<()> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(AuthError::MissingToken)
    }
}

/// Middleware that requires a valid access token
///
/// The role is re-read from storage so a deleted user's token stops working
/// immediately.
pub async fn require_bearer<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let token = extract_bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;
    let claims = state.config.tokens.verify_access_token(&token)?;

    let user = state
        .repo
        .find_by_id(UserId::new(claims.user_id))
        .await?
        .ok_or(AuthError::InvalidToken)?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: user.user_id,
        role: user.role(),
    });

    Ok(next.run(req).await)
}

/// Middleware that additionally requires an officer or developer
///
/// Must be layered inside [`require_bearer`].
pub async fn require_staff(
    caller: AuthenticatedUser,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    caller.require_staff()?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_rules() {
        let resident = AuthenticatedUser {
            user_id: UserId::new(5),
            role: UserRole::Resident,
        };
        let officer = AuthenticatedUser {
            user_id: UserId::new(1),
            role: UserRole::Officer,
        };

        assert!(resident.can_access(UserId::new(5)));
        assert!(!resident.can_access(UserId::new(6)));
        assert!(officer.can_access(UserId::new(6)));
        assert!(matches!(resident.require_staff(), Err(AuthError::Forbidden)));
        assert!(officer.require_staff().is_ok());
    }
}
