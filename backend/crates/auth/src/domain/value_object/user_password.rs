//! User Password Value Object
//!
//! Domain wrapper over `platform::password`. Hashing and verification are
//! CPU/memory heavy (Argon2id), so both run on the blocking thread pool.
//!
//! ## Usage
//! ```rust,ignore
//! let raw = RawPassword::new("Kettle#Orchid2024".to_string())?;
//! let hashed = UserPassword::hash(raw, pepper.clone()).await?;
//!
//! let attempt = RawPassword::for_login("Kettle#Orchid2024".to_string())?;
//! assert!(hashed.verify(attempt, pepper).await?);
//! ```

use platform::password::{ClearTextPassword, HashedPassword, PasswordHashError, Pepper};
use std::fmt;

use crate::error::AuthResult;

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Raw password from user input. Zeroized on drop.
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// A password about to be stored: the full NIST SP 800-63B policy applies
    pub fn new(raw: String) -> AuthResult<Self> {
        Ok(Self(ClearTextPassword::new(raw)?))
    }

    /// A password presented at login: only emptiness is rejected
    pub fn for_login(raw: String) -> AuthResult<Self> {
        Ok(Self(ClearTextPassword::for_verification(raw)?))
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Argon2id PHC string as stored in `users.password_hash`
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Pepper and hash off the async executor
    pub async fn hash(raw: RawPassword, pepper: Pepper) -> AuthResult<Self> {
        let hashed = tokio::task::spawn_blocking(move || raw.0.hash(&pepper)).await??;
        Ok(Self(hashed))
    }

    /// Constant-time verification off the async executor
    pub async fn verify(&self, raw: RawPassword, pepper: Pepper) -> AuthResult<bool> {
        let stored = self.0.clone();
        let valid = tokio::task::spawn_blocking(move || stored.verify(&raw.0, &pepper)).await?;
        Ok(valid)
    }

    /// Verify at login; a match against an outdated hash also yields a fresh
    /// Argon2id hash of the same password
    pub async fn verify_and_upgrade(
        &self,
        raw: RawPassword,
        pepper: Pepper,
    ) -> AuthResult<LoginCheck> {
        let stored = self.0.clone();
        let check = tokio::task::spawn_blocking(move || -> Result<LoginCheck, PasswordHashError> {
            if !stored.verify(&raw.0, &pepper) {
                return Ok(LoginCheck::Mismatch);
            }
            if !stored.needs_rehash() {
                return Ok(LoginCheck::Match { upgraded: None });
            }
            let upgraded = Self(raw.0.hash(&pepper)?);
            Ok(LoginCheck::Match {
                upgraded: Some(upgraded),
            })
        })
        .await??;
        Ok(check)
    }

    /// Parse a PHC string, rejecting malformed input
    pub fn from_phc_string(phc_string: impl Into<String>) -> AuthResult<Self> {
        Ok(Self(HashedPassword::from_phc_string(phc_string)?))
    }

    /// Load from the database without parsing; a corrupt value fails verification
    pub fn from_db(phc_string: impl Into<String>) -> Self {
        Self(HashedPassword::from_stored(phc_string))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    pub fn needs_rehash(&self) -> bool {
        self.0.needs_rehash()
    }
}

/// Outcome of [`UserPassword::verify_and_upgrade`]
#[derive(Debug)]
pub enum LoginCheck {
    Mismatch,
    Match { upgraded: Option<UserPassword> },
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    fn pepper() -> Pepper {
        Pepper::new(b"unit-test-pepper-0123456789".to_vec()).unwrap()
    }

    #[test]
    fn test_raw_password_validation() {
        assert!(RawPassword::new("Kettle#Orchid2024".to_string()).is_ok());
        assert!(matches!(
            RawPassword::new("short".to_string()),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            RawPassword::new("password123".to_string()),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            RawPassword::for_login(String::new()),
            Err(AuthError::Validation(_))
        ));
        // Login accepts legacy passwords that fail today's policy
        assert!(RawPassword::for_login("short".to_string()).is_ok());
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let raw = RawPassword::new("Kettle#Orchid2024".to_string()).unwrap();
        let hashed = UserPassword::hash(raw, pepper()).await.unwrap();

        let good = RawPassword::for_login("Kettle#Orchid2024".to_string()).unwrap();
        assert!(hashed.verify(good, pepper()).await.unwrap());

        let bad = RawPassword::for_login("Kettle#Orchid2025".to_string()).unwrap();
        assert!(!hashed.verify(bad, pepper()).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_hash_from_db_does_not_verify() {
        let stored = UserPassword::from_db("not-a-phc-string");
        let attempt = RawPassword::for_login("anything".to_string()).unwrap();
        assert!(!stored.verify(attempt, pepper()).await.unwrap());
        assert!(UserPassword::from_phc_string("not-a-phc-string").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let raw = RawPassword::new("SecretPassword123!".to_string()).unwrap();
        let debug = format!("{:?}", raw);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("Secret"));
    }
}
