//! # Moneymon Domain
//!
//! Business domain types and models for the Moneymon authentication backend.
//!
//! This crate contains:
//! - Local user and external identity types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Provider endpoint constants
//!
//! ## Architecture
//! - No dependencies on other Moneymon crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
