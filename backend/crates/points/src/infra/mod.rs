//! Infrastructure Layer - Database implementations

pub mod memory;
pub mod postgres;

pub use memory::InMemoryPointsRepository;
pub use postgres::PgPointsRepository;
