//! Modular common utilities shared across Moneymon crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: PKCE generation, clock abstraction
//! - `runtime`: shared in-memory state (PKCE session store)
//! - `test-utils`: deterministic clocks for tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;
#[cfg(feature = "foundation")]
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", all(test, feature = "foundation")))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use auth::pkce::PkceChallenge;
#[cfg(feature = "runtime")]
pub use auth::session_store::{PendingSession, PkceSessionStore};
#[cfg(feature = "foundation")]
pub use time::{Clock, SystemClock};
