//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Respect RUST_LOG, falling back to the configured filter

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ObservabilityConfig;

/// Initialize the global tracing subscriber.
///
/// `default_filter` is used when RUST_LOG is not set. Later calls (or an
/// embedding application that already installed its own subscriber) are
/// no-ops.
pub fn init_logging(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Initialize logging with the configured default filter
/// (`observability.log_filter`).
pub fn init_from_config(config: &ObservabilityConfig) {
    init_logging(&config.log_filter);
}
