//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (HMAC-SHA256)
//! - Password hashing (HMAC pepper + Argon2id, NIST SP 800-63B policy)
//! - Signed access/refresh tokens (JWT, HS256)
//! - Cookie and bearer header handling

pub mod cookie;
pub mod crypto;
pub mod password;
pub mod token;
