//! Points Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Residents, catalog, ledger entries, pure pricing and ranking rules
//! - `application/` - Ledger, leaderboard and archive use cases
//! - `infra/` - PostgreSQL and in-memory repositories
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Ledger Model
//! - `current_points` is spendable and never negative
//! - `total_points` only grows; redemptions leave it alone
//! - Every completion or redemption is one immutable transaction row with
//!   one item per distinct task or product
//! - Check and write happen under a per-resident lock in one storage transaction

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::ArchiveJob;
pub use application::config::PointsConfig;
pub use error::{PointsError, PointsResult};
pub use infra::{InMemoryPointsRepository, PgPointsRepository};
pub use presentation::{PointsAppState, points_router, points_router_generic};
