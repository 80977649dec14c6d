//! # Moneymon API
//!
//! HTTP layer and entry point.
//!
//! This crate contains:
//! - The axum router and login handlers
//! - Application context (dependency injection)
//! - Error envelope mapping and graceful shutdown
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;
pub mod error;
pub mod routes;
pub mod shutdown;

pub use context::AppContext;
pub use error::ApiError;
pub use routes::build_router;
