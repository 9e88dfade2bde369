//! Value Object Module

pub mod email;
pub mod user_name;
pub mod user_password;
pub mod user_role;

/// Numeric user id from the kernel (residents log in with it)
pub use kernel::id::UserId;
