//! Observability: structured logging and transfer metrics.

pub mod logging;
pub mod metrics;

pub use logging::{init_from_config, init_logging};
