//! Semantic configuration checks, run after deserialization.

use crate::config::schema::PipelineConfig;

/// A single semantic defect found in a config.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("stream.chunk_size must be non-zero")]
    ZeroChunkSize,

    #[error("stream.high_watermark ({watermark}) must be >= stream.chunk_size ({chunk_size})")]
    WatermarkBelowChunkSize { watermark: usize, chunk_size: usize },
}

/// Validate a deserialized config. Returns every defect, not just the
/// first.
pub fn validate_config(config: &PipelineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.stream.chunk_size == 0 {
        errors.push(ValidationError::ZeroChunkSize);
    } else if config.stream.high_watermark < config.stream.chunk_size {
        errors.push(ValidationError::WatermarkBelowChunkSize {
            watermark: config.stream.high_watermark,
            chunk_size: config.stream.chunk_size,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
