//! Test utilities shared by Moneymon crates
//!
//! Enabled through the `test-utils` feature for downstream test targets.

pub mod time;

pub use self::time::MockClock;
