//! Application Configuration
//!
//! Configuration for the Auth application layer. Built once by the binary
//! from the environment and shared behind an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::password::Pepper;
use platform::token::{TokenKind, TokenService};

use crate::error::AuthResult;

/// Default refresh cookie name
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Password pepper (application-wide secret, never stored)
    pub pepper: Pepper,
    /// Access/refresh token issuer
    pub tokens: Arc<TokenService>,
    /// Refresh cookie name
    pub refresh_cookie_name: String,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
}

impl AuthConfig {
    pub fn new(pepper: Pepper, tokens: TokenService) -> Self {
        Self {
            pepper,
            tokens: Arc::new(tokens),
            refresh_cookie_name: REFRESH_COOKIE_NAME.to_string(),
            cookie_secure: true,
        }
    }

    /// Build from raw secret material
    pub fn from_secrets(
        pepper: &[u8],
        access_secret: &[u8],
        access_ttl: Duration,
        refresh_secret: &[u8],
        refresh_ttl: Duration,
    ) -> AuthResult<Self> {
        let pepper = Pepper::new(pepper.to_vec())?;
        let tokens = TokenService::new(access_secret, access_ttl, refresh_secret, refresh_ttl)?;
        Ok(Self::new(pepper, tokens))
    }

    /// Create config for development (insecure cookie)
    pub fn with_insecure_cookie(mut self) -> Self {
        self.cookie_secure = false;
        self
    }

    /// Cookie carrying the refresh token; lives as long as the token
    pub fn refresh_cookie(&self) -> CookieConfig {
        CookieConfig::refresh_token(
            self.refresh_cookie_name.clone(),
            self.cookie_secure,
            self.tokens.ttl(TokenKind::Refresh).as_secs(),
        )
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::from_secrets(
            b"unit-test-pepper-0123456789",
            b"access-secret-for-tests-32-bytes!!",
            Duration::from_secs(15 * 60),
            b"refresh-secret-for-tests-32-bytes!",
            Duration::from_secs(7 * 24 * 3600),
        )
        .expect("test secrets are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    #[test]
    fn test_short_pepper_is_configuration_error() {
        let result = AuthConfig::from_secrets(
            b"",
            b"access-secret-for-tests-32-bytes!!",
            Duration::from_secs(900),
            b"refresh-secret-for-tests-32-bytes!",
            Duration::from_secs(3600),
        );
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn test_weak_token_secret_is_configuration_error() {
        let result = AuthConfig::from_secrets(
            b"unit-test-pepper-0123456789",
            b"short",
            Duration::from_secs(900),
            b"refresh-secret-for-tests-32-bytes!",
            Duration::from_secs(3600),
        );
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn test_refresh_cookie_max_age_matches_ttl() {
        let config = AuthConfig::for_tests().with_insecure_cookie();
        let cookie = config.refresh_cookie().build_set_cookie("tok");
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let output = format!("{:?}", AuthConfig::for_tests());
        assert!(!output.contains("unit-test-pepper"));
        assert!(!output.contains("access-secret"));
    }
}
