//! Response streaming pipeline core.
//!
//! # Architecture Overview
//!
//! ```text
//!   handler result                 ┌──────────────────────────────────┐
//!   ─────────────────────────────▶│        ResponseEnvelope           │
//!                                 │   Raw │ Stream │ Wrapped           │
//!                                 └───────────────┬──────────────────┘
//!                                                 │ hook chain
//!                                                 │ (replace / abort)
//!                                                 ▼
//!                                 ┌──────────────────────────────────┐
//!                                 │        ResponsePipeline           │
//!                                 │  status + headers + content type  │
//!                                 └───────────────┬──────────────────┘
//!                                                 │
//!                                                 ▼
//!    ByteSource ──▶ StreamBridge ──▶ Sink (connection layer buffer)
//!    buffer|file|push    │               │
//!                        └── pause ◀─────┘ over capacity
//!                        └── resume ◀──── drain event
//! ```
//!
//! Two independent cores: the backpressure-correct stream-to-sink bridge
//! and the total `Content-Type` parser ([`MediaType`]). Routing, TLS, and
//! connection lifecycle belong to the embedding application.

// Core subsystems
pub mod config;
pub mod envelope;
pub mod media;
pub mod pipeline;
pub mod stream;

// Cross-cutting concerns
pub mod observability;

pub use config::PipelineConfig;
pub use envelope::{HookChain, HookError, ResponseEnvelope, SendHook, WrappedResponse};
pub use media::MediaType;
pub use pipeline::{FinalizedResponse, PipelineError, ResponsePipeline};
pub use stream::{ByteSource, Sink, StreamBridge, TransferError};
