//! Observability infrastructure
//!
//! Structured logging through `tracing`. Fields used across the crate:
//! `provider`, `flow_state`, `error`. Secrets never appear in log fields.

pub mod logging;

pub use logging::{init, LoggingOptions};
