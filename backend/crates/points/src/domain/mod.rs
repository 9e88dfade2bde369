//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Resident, Task, Product, Transaction)
//! - Domain value objects (TransactionKind, LeaderboardType, Period, Page)
//! - Domain services (pricing, balance arithmetic, ranking, inactivity)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
