//! Application Layer
//!
//! Use cases and application services.

pub mod change_password;
pub mod config;
pub mod current_user;
pub mod login;
pub mod refresh;
pub mod register_user;

// Re-exports
pub use change_password::{ChangePasswordInput, ChangePasswordUseCase};
pub use config::AuthConfig;
pub use current_user::CurrentUserUseCase;
pub use login::{LoginIdentifier, LoginInput, LoginOutput, LoginUseCase};
pub use refresh::RefreshUseCase;
pub use register_user::{RegisterUserInput, RegisterUserUseCase};

#[cfg(test)]
mod tests;
