//! User Name Value Object
//!
//! 表示用の氏名。ログイン識別子ではない（居住者は数値ID、職員はメールでログイン）。
//!
//! ## 不変条件
//! - 前後の空白は除去
//! - 長さ: 1〜100文字（正規化後）
//! - 制御文字は禁止

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AuthError;

/// Maximum length for user name (in characters)
pub const USER_NAME_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserName(String);

impl UserName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AuthError> {
        let name = raw.as_ref().trim();

        if name.is_empty() {
            return Err(AuthError::Validation("User name cannot be empty".into()));
        }

        if name.chars().count() > USER_NAME_MAX_LENGTH {
            return Err(AuthError::Validation(format!(
                "User name must be at most {} characters",
                USER_NAME_MAX_LENGTH
            )));
        }

        if name.chars().any(char::is_control) {
            return Err(AuthError::Validation(
                "User name contains invalid characters".into(),
            ));
        }

        Ok(Self(name.to_string()))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_name_trimmed() {
        let name = UserName::new("  Tan Ah Kow ").unwrap();
        assert_eq!(name.as_str(), "Tan Ah Kow");
    }

    #[test]
    fn test_user_name_invalid() {
        assert!(UserName::new("").is_err());
        assert!(UserName::new("   ").is_err());
        assert!(UserName::new("bad\u{0007}name").is_err());
        assert!(UserName::new("x".repeat(USER_NAME_MAX_LENGTH + 1)).is_err());
        assert!(UserName::new("x".repeat(USER_NAME_MAX_LENGTH)).is_ok());
    }
}
