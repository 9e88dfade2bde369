//! Password Hashing and Verification
//!
//! NIST SP 800-63B compliant password handling with:
//! - HMAC-SHA256 pepper applied before hashing (server-held secret)
//! - Argon2id hashing of the peppered digest (memory-hard, recommended by OWASP)
//! - Zeroization of sensitive data
//! - Constant-time comparison (delegated to Argon2)
//!
//! ## Pipeline
//! ```text
//! plaintext --NFKC--> normalized --HMAC(pepper)--> 64 hex chars --Argon2id--> PHC string
//! ```
//!
//! The pepper is mandatory. There is no code path that hashes or verifies
//! without one: a missing pepper is a configuration error, never a fallback.

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::hmac_sha256_hex;

// ============================================================================
// Constants (NIST SP 800-63B compliant)
// ============================================================================

/// Minimum password length (NIST: SHALL be at least 8)
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (NIST: SHOULD permit at least 64)
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Minimum pepper length in bytes
pub const MIN_PEPPER_LENGTH: usize = 16;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors (new passwords only)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    #[error("Password is too common or follows a predictable pattern")]
    CommonPattern,
}

/// Password hashing/verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordHashError {
    /// No plaintext supplied
    #[error("Password is required")]
    MissingPassword,

    /// Server pepper is absent or unusable
    #[error("Password pepper is not configured")]
    MissingPepper,

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Pepper (server secret, zeroized on drop)
// ============================================================================

/// Application-wide password pepper
///
/// Never stored in the database. Loaded once at startup.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Pepper(Vec<u8>);

impl Pepper {
    /// Wrap pepper bytes, rejecting empty or short values
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, PasswordHashError> {
        let bytes = bytes.into();
        if bytes.len() < MIN_PEPPER_LENGTH {
            return Err(PasswordHashError::MissingPepper);
        }
        Ok(Self(bytes))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Pepper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pepper").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Create a new password for storage, enforcing the full policy
    ///
    /// Validates against NIST SP 800-63B requirements:
    /// - Minimum 8 characters
    /// - Maximum 128 characters
    /// - No control characters
    /// - Not empty/whitespace only
    ///
    /// Unicode is normalized using NFKC before validation.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized = Self::normalize(raw);

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        // NIST: Count Unicode code points (not bytes)
        let char_count = normalized.chars().count();

        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        if is_common_pattern(&normalized) {
            return Err(PasswordPolicyError::CommonPattern);
        }

        Ok(Self(normalized))
    }

    /// Create a password for comparison against a stored hash
    ///
    /// Only rejects empty input; accounts created before the policy existed
    /// must still be able to log in.
    pub fn for_verification(raw: String) -> Result<Self, PasswordHashError> {
        if raw.is_empty() {
            return Err(PasswordHashError::MissingPassword);
        }
        Ok(Self(Self::normalize(raw)))
    }

    fn normalize(mut raw: String) -> String {
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();
        normalized
    }

    /// HMAC the password with the pepper; the hex digest is what Argon2 sees
    fn peppered(&self, pepper: &Pepper) -> Result<Zeroizing<String>, PasswordHashError> {
        hmac_sha256_hex(pepper.as_bytes(), self.0.as_bytes())
            .map(Zeroizing::new)
            .ok_or_else(|| PasswordHashError::HashingFailed("pepper rejected by HMAC".into()))
    }

    /// Hash the password using HMAC pepper + Argon2id
    ///
    /// ## Returns
    /// PHC-formatted hash string wrapped in `HashedPassword`
    pub fn hash(&self, pepper: &Pepper) -> Result<HashedPassword, PasswordHashError> {
        let peppered = self.peppered(pepper)?;

        // Random salt (128 bits)
        let salt = SaltString::generate(OsRng);

        // OWASP recommended Argon2id parameters:
        // m=19456 (19 MiB), t=2, p=1
        let hash = Argon2::default()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
///
/// Contains algorithm, version, parameters, salt and hash.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    /// Wrap a stored hash without parsing it
    ///
    /// A corrupt value then simply fails verification instead of making the
    /// whole user record unreadable.
    pub fn from_stored(s: impl Into<String>) -> Self {
        Self { hash: s.into() }
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash
    ///
    /// Argon2 performs the final comparison in constant time.
    pub fn verify(&self, password: &ClearTextPassword, pepper: &Pepper) -> bool {
        let peppered = match password.peppered(pepper) {
            Ok(p) => p,
            Err(_) => return false,
        };

        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => {
                tracing::warn!("Stored password hash is not a valid PHC string");
                return false;
            }
        };

        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// True if the hash was produced by anything other than Argon2id
    pub fn needs_rehash(&self) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => parsed.algorithm != argon2::Algorithm::Argon2id.ident(),
            Err(_) => true,
        }
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Function-style API
// ============================================================================

/// `hash(plain, pepper)`: applies the storage policy, then peppers and hashes
///
/// A missing pepper fails closed with [`PasswordHashError::MissingPepper`].
pub fn hash_password(
    plain: &str,
    pepper: Option<&Pepper>,
) -> Result<HashedPassword, PasswordError> {
    if plain.is_empty() {
        return Err(PasswordHashError::MissingPassword.into());
    }
    let pepper = pepper.ok_or(PasswordHashError::MissingPepper)?;
    let password = ClearTextPassword::new(plain.to_owned())?;
    Ok(password.hash(pepper)?)
}

/// `verify(plain, pepper, stored)`
pub fn verify_password(
    plain: &str,
    pepper: Option<&Pepper>,
    stored: &HashedPassword,
) -> Result<bool, PasswordError> {
    let pepper = pepper.ok_or(PasswordHashError::MissingPepper)?;
    let password = ClearTextPassword::for_verification(plain.to_owned())?;
    Ok(stored.verify(&password, pepper))
}

/// Either a policy rejection or a hashing failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error(transparent)]
    Policy(#[from] PasswordPolicyError),

    #[error(transparent)]
    Hash(#[from] PasswordHashError),
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Check for common weak patterns
fn is_common_pattern(password: &str) -> bool {
    let lower = password.to_lowercase();

    // All same character (e.g., "aaaaaaaa")
    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    if is_sequential_numbers(&lower) {
        return true;
    }

    const KEYBOARD_PATTERNS: &[&str] = &["qwerty", "asdfgh", "zxcvbn", "qazwsx", "1qaz2wsx"];
    if KEYBOARD_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    const COMMON_PASSWORDS: &[&str] = &[
        "password",
        "password1",
        "password123",
        "abcdefgh",
        "letmein1",
        "welcome1",
        "admin123",
        "iloveyou",
        "sunshine",
        "princess",
        "football",
        "baseball",
        "trustno1",
        "minimart",
        "minimart123",
    ];

    COMMON_PASSWORDS.contains(&lower.as_str())
}

/// Check if string is a run of sequential digits
fn is_sequential_numbers(s: &str) -> bool {
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() < 4 {
        return false;
    }

    let is_ascending = digits
        .windows(2)
        .all(|w| w[1] == w[0] + 1 || (w[0] == 9 && w[1] == 0));

    let is_descending = digits
        .windows(2)
        .all(|w| w[0] == w[1] + 1 || (w[0] == 0 && w[1] == 9));

    is_ascending || is_descending
}

// ============================================================================
// Tests
// ============================================================================
