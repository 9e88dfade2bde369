//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::User;
use crate::domain::value_object::user_role::UserRole;

// ============================================================================
// Login
// ============================================================================

/// Resident login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidentLoginRequest {
    pub user_id: i64,
    pub password: String,
}

/// Officer login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficerLoginRequest {
    pub officer_email: String,
    pub password: String,
}

/// Login response (refresh token is also set as an HttpOnly cookie)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

// ============================================================================
// Refresh
// ============================================================================

/// Refresh request body; the cookie takes precedence when both are present
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

// ============================================================================
// Registration / Password
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub user_name: String,
    pub role: UserRole,
    pub password: String,
    pub profile_picture: Option<String>,
    pub officer_email: Option<String>,
    pub batch_number: Option<i32>,
    pub date_of_admission: Option<NaiveDate>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserResponse {
    pub user_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ============================================================================
// User Info
// ============================================================================

/// Public view of a user; never includes the password hash
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub user_id: i64,
    pub user_name: String,
    pub role: UserRole,
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub officer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<i32>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.get(),
            user_name: user.user_name.as_str().to_string(),
            role: user.role(),
            profile_picture: user.profile_picture.clone(),
            officer_email: user.profile.officer_email().map(|e| e.as_str().to_string()),
            batch_number: user.profile.resident().map(|r| r.batch_number),
            last_login_at: user.last_login_at,
        }
    }
}
