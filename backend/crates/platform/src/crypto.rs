//! Cryptographic Utilities
//!
//! HMAC-SHA256 keyed hashing used to pepper passwords.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 with a key of any length
///
/// Returns `None` only if the MAC backend rejects the key, which HMAC never
/// does; callers treat it as an internal failure instead of panicking.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Option<[u8; 32]> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(data);
    Some(mac.finalize().into_bytes().into())
}

/// HMAC-SHA256 as lowercase hex (64 chars)
pub fn hmac_sha256_hex(key: &[u8], data: &[u8]) -> Option<String> {
    hmac_sha256(key, data).map(hex::encode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_rfc4231_case_2() {
        // RFC 4231 test case 2
        let mac = hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            mac,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_hmac_key_sensitivity() {
        let a = hmac_sha256(b"key-one", b"message").unwrap();
        let b = hmac_sha256(b"key-two", b"message").unwrap();
        assert_ne!(a, b);
    }
}
