//! HTTP Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use platform::cookie::extract_cookie;

use crate::application::config::AuthConfig;
use crate::application::{
    ChangePasswordInput, ChangePasswordUseCase, CurrentUserUseCase, LoginIdentifier, LoginInput,
    LoginOutput, LoginUseCase, RefreshUseCase, RegisterUserInput, RegisterUserUseCase,
};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::UserId;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ChangePasswordRequest, LoginResponse, OfficerLoginRequest, PublicUser, RefreshRequest,
    RefreshResponse, RegisterUserRequest, RegisterUserResponse, ResidentLoginRequest,
};
use crate::presentation::middleware::AuthenticatedUser;

/// Shared state for auth handlers and the bearer middleware
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

impl<R> AuthAppState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: R, config: AuthConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Login
// ============================================================================

/// POST /authentication/login/resident
pub async fn login_resident<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<ResidentLoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let input = LoginInput {
        identifier: LoginIdentifier::Resident(UserId::new(req.user_id)),
        password: req.password,
    };
    login(state, input).await
}

/// POST /authentication/login/officer
pub async fn login_officer<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<OfficerLoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let input = LoginInput {
        identifier: LoginIdentifier::Officer(req.officer_email),
        password: req.password,
    };
    login(state, input).await
}

async fn login<R>(state: AuthAppState<R>, input: LoginInput) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(state.repo.clone(), state.config.clone());
    let LoginOutput { tokens, user } = use_case.execute(input).await?;

    let cookie = state
        .config
        .refresh_cookie()
        .build_set_cookie(&tokens.refresh_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: PublicUser::from(&user),
        }),
    ))
}

// ============================================================================
// Refresh / Logout
// ============================================================================

/// POST /authentication/refresh
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    body: Bytes,
) -> AuthResult<Json<RefreshResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let from_cookie = extract_cookie(&headers, &state.config.refresh_cookie_name);

    let token = match from_cookie {
        Some(token) => token,
        None if body.is_empty() => return Err(AuthError::MissingToken),
        None => {
            let req: RefreshRequest = serde_json::from_slice(&body)
                .map_err(|e| AuthError::Validation(format!("Invalid request body: {e}")))?;
            req.refresh_token.ok_or(AuthError::MissingToken)?
        }
    };

    let use_case = RefreshUseCase::new(state.repo.clone(), state.config.clone());
    let access_token = use_case.execute(&token).await?;

    Ok(Json(RefreshResponse { access_token }))
}

/// POST /authentication/logout
///
/// Tokens are stateless; logging out only drops the refresh cookie.
pub async fn logout<R>(State(state): State<AuthAppState<R>>) -> impl IntoResponse
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let cookie = state.config.refresh_cookie().build_delete_cookie();
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}

// ============================================================================
// Authenticated
// ============================================================================

/// GET /authentication/me
pub async fn me<R>(
    State(state): State<AuthAppState<R>>,
    caller: AuthenticatedUser,
) -> AuthResult<Json<PublicUser>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case = CurrentUserUseCase::new(state.repo.clone());
    let user = use_case.execute(caller.user_id).await?;
    Ok(Json(PublicUser::from(&user)))
}

/// POST /authentication/users
pub async fn register_user<R>(
    State(state): State<AuthAppState<R>>,
    caller: AuthenticatedUser,
    Json(req): Json<RegisterUserRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case = RegisterUserUseCase::new(state.repo.clone(), state.config.clone());

    let input = RegisterUserInput {
        user_name: req.user_name,
        role: req.role,
        password: req.password,
        profile_picture: req.profile_picture,
        officer_email: req.officer_email,
        batch_number: req.batch_number,
        date_of_admission: req.date_of_admission,
        date_of_birth: req.date_of_birth,
    };

    let user_id = use_case.execute(caller.role, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterUserResponse {
            user_id: user_id.get(),
        }),
    ))
}

/// POST /authentication/password
pub async fn change_password<R>(
    State(state): State<AuthAppState<R>>,
    caller: AuthenticatedUser,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case = ChangePasswordUseCase::new(state.repo.clone(), state.config.clone());

    let input = ChangePasswordInput {
        current_password: req.current_password,
        new_password: req.new_password,
    };
    use_case.execute(caller.user_id, input).await?;

    Ok(StatusCode::NO_CONTENT)
}
