//! Entity Module

pub mod user;

pub use user::{NewUser, ResidentProfile, User, UserProfile};
