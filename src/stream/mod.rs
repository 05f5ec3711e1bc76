//! Streaming subsystem.
//!
//! # Data Flow
//! ```text
//! handler / hook chain
//!     → ByteSource (buffer | file | push queue | stream adapter)
//!     → StreamBridge::transfer (ordered, one chunk in flight)
//!     → Sink (connection-layer buffer, drain signal)
//! ```
//!
//! # Design Decisions
//! - Backpressure is consumer-driven: the sink's over-capacity return
//!   pauses the bridge until the drain event fires
//! - Sources are single-use; the consumed flag turns a second read into a
//!   hard error instead of an empty body

pub mod bridge;
pub mod sink;
pub mod source;

pub use bridge::{StreamBridge, TransferError, TransferStats};
pub use sink::{BufferSink, DrainSignal, Sink};
pub use source::{ByteSource, PushHandle, SourceError, DEFAULT_CHUNK_SIZE};
