//! Presentation Layer - HTTP handlers

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::PointsAppState;
pub use router::{points_router, points_router_generic};
