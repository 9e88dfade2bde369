//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Users, roles, profiles, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router, bearer middleware
//!
//! ## Features
//! - Resident login by numeric user id, officer login by email
//! - Stateless JWT access/refresh tokens (refresh also as HttpOnly cookie)
//! - Staff-only user registration, self-service password change
//!
//! ## Security Model
//! - Passwords peppered with HMAC-SHA256, then hashed with Argon2id
//! - Argon2 runs on the blocking pool, never on the async executor
//! - Unknown identifiers and wrong-flow identifiers fail identically

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use domain::value_object::user_role::UserRole;
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryUserRepository, PgUserRepository};
pub use presentation::{AuthAppState, AuthenticatedUser, auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
