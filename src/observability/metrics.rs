//! Transfer metrics.
//!
//! # Metrics
//! - `reply_stream_transfers_total` (counter): completed transfers
//! - `reply_stream_transfer_bytes_total` (counter): bytes written to sinks
//! - `reply_stream_transfer_chunks_total` (counter): chunks written
//! - `reply_stream_transfer_errors_total` (counter): aborted transfers,
//!   labeled by error kind
//!
//! # Design Decisions
//! - Facade only: exposition (Prometheus endpoint etc.) is wired by the
//!   embedding application through the `metrics` recorder of its choice

use metrics::counter;

/// Record a completed transfer.
pub fn record_transfer(bytes: u64, chunks: u64) {
    counter!("reply_stream_transfers_total").increment(1);
    counter!("reply_stream_transfer_bytes_total").increment(bytes);
    counter!("reply_stream_transfer_chunks_total").increment(chunks);
}

/// Record an aborted transfer.
pub fn record_transfer_error(kind: &'static str) {
    counter!("reply_stream_transfer_errors_total", "kind" => kind).increment(1);
}
