//! Response finalization pipeline.
//!
//! # Responsibilities
//! - Run the send-hook chain over the handler's envelope
//! - Decide status, headers, and content type per payload kind
//! - Hand every body kind to the bridge, re-chunking raw payloads at the
//!   configured chunk size
//!
//! # Design Decisions
//! - Head serialization belongs to the connection layer; the pipeline
//!   returns the finalized status and headers alongside transfer stats
//! - Hook errors and transfer errors stay distinct so the external error
//!   handler can react per kind (its contract includes dropping any
//!   content-type set by the failed attempt)

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};

use crate::config::StreamConfig;
use crate::envelope::{HookChain, HookError, ResponseEnvelope};
use crate::stream::{ByteSource, Sink, StreamBridge, TransferError, TransferStats};

/// Error leaving the pipeline; routed to the error-handler collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A send hook rejected the envelope.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// Transferring the body failed.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Status, headers, and transfer outcome of a finalized response. The
/// connection layer serializes the head from this.
#[derive(Debug)]
pub struct FinalizedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub stats: TransferStats,
}

/// Runs hooks, then finalizes the resulting envelope against a sink.
#[derive(Debug, Default)]
pub struct ResponsePipeline {
    hooks: HookChain,
    bridge: StreamBridge,
    stream_config: StreamConfig,
}

impl ResponsePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline honoring the configured stream and observability
    /// settings (raw payloads are re-chunked at the configured chunk
    /// size, transfer metrics follow `observability.metrics_enabled`).
    pub fn with_config(config: &crate::config::PipelineConfig) -> Self {
        Self {
            hooks: HookChain::new(),
            bridge: StreamBridge::new().with_metrics(config.observability.metrics_enabled),
            stream_config: config.stream.clone(),
        }
    }

    /// Register a post-processing hook; hooks run in registration order,
    /// before any body byte is written.
    pub fn add_hook(&mut self, hook: impl crate::envelope::SendHook + 'static) -> &mut Self {
        self.hooks.add(hook);
        self
    }

    /// Finalize an envelope: run hooks, then write the body to the sink.
    ///
    /// Raw payloads get an inferred content type and are re-chunked at
    /// the configured chunk size; stream and wrapped payloads go through
    /// the bridge with full backpressure. For wrapped payloads, status
    /// and headers come from the wrapper.
    pub async fn send<S: Sink>(
        &self,
        envelope: ResponseEnvelope,
        sink: &mut S,
    ) -> Result<FinalizedResponse, PipelineError> {
        let envelope = self.hooks.run(envelope)?;
        tracing::debug!(kind = envelope.kind(), "Finalizing response");

        match envelope {
            ResponseEnvelope::Raw(payload) => {
                let mut headers = HeaderMap::new();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(payload.content_type()));

                let bytes = payload.into_bytes();
                let source = ByteSource::chunked(bytes, self.stream_config.chunk_size);
                let stats = self.bridge.transfer(source, sink).await?;
                Ok(FinalizedResponse {
                    status: StatusCode::OK,
                    headers,
                    stats,
                })
            }
            ResponseEnvelope::Stream(source) => {
                let mut headers = HeaderMap::new();
                headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/octet-stream"),
                );

                let stats = self.bridge.transfer(source, sink).await?;
                Ok(FinalizedResponse {
                    status: StatusCode::OK,
                    headers,
                    stats,
                })
            }
            ResponseEnvelope::Wrapped(wrapped) => {
                let (status, headers, body) = wrapped.into_parts();
                let stats = self.bridge.transfer(body, sink).await?;
                Ok(FinalizedResponse {
                    status,
                    headers,
                    stats,
                })
            }
        }
    }
}
