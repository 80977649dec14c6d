//! Global `tracing` subscriber setup

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::loader::env_bool;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,moneymon=debug";

/// Subscriber options resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    pub filter: String,
    pub json: bool,
}

impl LoggingOptions {
    /// `RUST_LOG` for the filter and `MONEYMON_LOG_JSON` for the format.
    #[must_use]
    pub fn from_env() -> Self {
        let filter = std::env::var("RUST_LOG")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        Self { filter, json: env_bool("MONEYMON_LOG_JSON", false) }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed; the existing one
/// is kept.
pub fn init(options: &LoggingOptions) -> bool {
    let filter = options.env_filter();
    let result = if options.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(false).with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(true)).try_init()
    };
    result.is_ok()
}
