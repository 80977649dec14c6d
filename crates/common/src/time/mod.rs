//! Time abstraction for testability
//!
//! Production code takes `Arc<dyn Clock>` so TTL logic can be exercised
//! with [`crate::testing::MockClock`] instead of sleeping.

mod clock;

pub use clock::{Clock, SystemClock};
