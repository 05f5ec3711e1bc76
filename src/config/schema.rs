//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files,
//! with defaults so a minimal (or missing) config still works.

use serde::{Deserialize, Serialize};

use crate::stream::DEFAULT_CHUNK_SIZE;

/// Root configuration for the response pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Streaming behavior (chunk sizes, watermark).
    pub stream: StreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Streaming configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Chunk size for file reads and re-chunked buffers, in bytes.
    pub chunk_size: usize,

    /// Sink buffer high watermark, in bytes. Writes past this point
    /// report over-capacity and pause the producer.
    pub high_watermark: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            high_watermark: 16 * DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when RUST_LOG is not set.
    pub log_filter: String,

    /// Whether transfer metrics are recorded.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "reply_stream=info".to_string(),
            metrics_enabled: true,
        }
    }
}
