//! # Moneymon Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Configuration loading (environment and files)
//! - SQLite user storage (rusqlite + r2d2)
//! - Outbound HTTP client and identity provider adapters
//! - Google JWKS verification and HS256 session tokens
//! - PKCE session sweeper and logging setup
//!
//! ## Architecture
//! - Implements traits defined in `moneymon-core`
//! - Contains all "impure" code (I/O, network, storage)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod observability;
pub mod providers;
pub mod session;

// Re-export commonly used items
pub use database::{DbManager, SqliteUserRepository};
pub use errors::InfraError;
pub use http::HttpClient;
pub use providers::build_registry;
pub use session::{JwtSessionSigner, SessionSweeper};
