//! Auth Router
//!
//! Mounted under `/authentication` by the binary.

use axum::{Router, middleware::from_fn_with_state, routing::{get, post}};

use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::infra::postgres::PgUserRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_bearer;

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(repo: PgUserRepository, config: AuthConfig) -> Router {
    auth_router_generic(AuthAppState::new(repo, config))
}

/// Create a generic Auth router for any repository implementation
pub fn auth_router_generic<R>(state: AuthAppState<R>) -> Router
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let protected = Router::new()
        .route("/me", get(handlers::me::<R>))
        .route("/users", post(handlers::register_user::<R>))
        .route("/password", post(handlers::change_password::<R>))
        .route_layer(from_fn_with_state(state.clone(), require_bearer::<R>));

    Router::new()
        .route("/login/resident", post(handlers::login_resident::<R>))
        .route("/login/officer", post(handlers::login_officer::<R>))
        .route("/refresh", post(handlers::refresh::<R>))
        .route("/logout", post(handlers::logout::<R>))
        .merge(protected)
        .with_state(state)
}
