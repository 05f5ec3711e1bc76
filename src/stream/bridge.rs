//! Stream-to-sink transfer with backpressure.
//!
//! # Responsibilities
//! - Pump chunks from a [`ByteSource`] to a [`Sink`] in order
//! - Pause on the sink's over-capacity signal, resume on drain
//! - Fail fast on an already-consumed body
//!
//! # Design Decisions
//! - No buffering beyond the single in-flight chunk; the sink's own queue
//!   plus its drain signal are the only throttle
//! - Partial writes are not retracted on error
//! - One transfer per sink at a time (the transfer borrows the sink
//!   mutably for its whole duration)

use crate::observability::metrics;
use crate::stream::sink::Sink;
use crate::stream::source::{ByteSource, SourceError};

/// Error aborting an in-progress transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The body was already drained when the transfer was attempted.
    /// Surfaced before any write, so a programming error is never masked
    /// as an empty successful response.
    #[error("response body already consumed")]
    BodyAlreadyConsumed,

    /// Reading from the source failed.
    #[error("source read failed: {0}")]
    Source(#[source] SourceError),

    /// Writing to the sink failed.
    #[error("sink write failed: {0}")]
    Sink(#[source] std::io::Error),
}

/// Outcome of a completed transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Chunks written to the sink.
    pub chunks: u64,
    /// Total bytes written.
    pub bytes: u64,
    /// Pause periods spent waiting for the sink to drain.
    pub pauses: u64,
}

/// Pumps bytes from a source to a sink while respecting flow control.
#[derive(Debug, Clone, Copy)]
pub struct StreamBridge {
    metrics_enabled: bool,
}

impl Default for StreamBridge {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl StreamBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable transfer metrics (`observability.metrics_enabled`).
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// Transfer the whole source into the sink.
    ///
    /// Chunks are written in production order, one at a time. When a write
    /// reports over-capacity the bridge suspends until the sink's drain
    /// event fires, then resumes pulling. On success the source is marked
    /// consumed and stats are returned.
    ///
    /// # Errors
    ///
    /// [`TransferError::BodyAlreadyConsumed`] if the source was drained
    /// before the transfer started (no write is attempted); otherwise the
    /// first source or sink failure aborts the transfer, leaving already
    /// flushed bytes in place.
    pub async fn transfer<S: Sink>(
        &self,
        mut source: ByteSource,
        sink: &mut S,
    ) -> Result<TransferStats, TransferError> {
        if source.is_consumed() {
            self.record_error("body_already_consumed");
            return Err(TransferError::BodyAlreadyConsumed);
        }

        let mut stats = TransferStats::default();
        loop {
            let chunk = match source.next_chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    self.record_error("source");
                    return Err(TransferError::Source(e));
                }
            };

            stats.chunks += 1;
            stats.bytes += chunk.len() as u64;

            let over_capacity = sink.write(chunk).map_err(|e| {
                self.record_error("sink");
                TransferError::Sink(e)
            })?;

            if over_capacity {
                stats.pauses += 1;
                tracing::trace!(
                    chunks = stats.chunks,
                    bytes = stats.bytes,
                    "Sink over capacity, pausing producer"
                );
                sink.drained().await.map_err(|e| {
                    self.record_error("sink");
                    TransferError::Sink(e)
                })?;
            }
        }

        source.mark_consumed();
        if self.metrics_enabled {
            metrics::record_transfer(stats.bytes, stats.chunks);
        }
        tracing::debug!(
            chunks = stats.chunks,
            bytes = stats.bytes,
            pauses = stats.pauses,
            "Transfer complete"
        );
        Ok(stats)
    }

    fn record_error(&self, kind: &'static str) {
        if self.metrics_enabled {
            metrics::record_transfer_error(kind);
        }
    }

    #[cfg(test)]
    pub(crate) fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::sink::BufferSink;
    use bytes::Bytes;
    use std::io;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Recorder counting every counter increment, for asserting the
    /// metrics gate.
    struct RecorderSpy {
        increments: Arc<AtomicU64>,
    }

    struct SpyCounter(Arc<AtomicU64>);

    impl ::metrics::CounterFn for SpyCounter {
        fn increment(&self, _value: u64) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn absolute(&self, _value: u64) {}
    }

    impl ::metrics::Recorder for RecorderSpy {
        fn describe_counter(
            &self,
            _: ::metrics::KeyName,
            _: Option<::metrics::Unit>,
            _: ::metrics::SharedString,
        ) {
        }

        fn describe_gauge(
            &self,
            _: ::metrics::KeyName,
            _: Option<::metrics::Unit>,
            _: ::metrics::SharedString,
        ) {
        }

        fn describe_histogram(
            &self,
            _: ::metrics::KeyName,
            _: Option<::metrics::Unit>,
            _: ::metrics::SharedString,
        ) {
        }

        fn register_counter(
            &self,
            _: &::metrics::Key,
            _: &::metrics::Metadata<'_>,
        ) -> ::metrics::Counter {
            ::metrics::Counter::from_arc(Arc::new(SpyCounter(Arc::clone(&self.increments))))
        }

        fn register_gauge(&self, _: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Gauge {
            ::metrics::Gauge::noop()
        }

        fn register_histogram(
            &self,
            _: &::metrics::Key,
            _: &::metrics::Metadata<'_>,
        ) -> ::metrics::Histogram {
            ::metrics::Histogram::noop()
        }
    }

    /// Sink that records write order and fails after a set number of
    /// writes.
    struct FailingSink {
        written: usize,
        fail_after: usize,
    }

    impl Sink for FailingSink {
        fn write(&mut self, _chunk: Bytes) -> Result<bool, io::Error> {
            if self.written >= self.fail_after {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer closed"));
            }
            self.written += 1;
            Ok(false)
        }

        async fn drained(&mut self) -> Result<(), io::Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn transfers_all_bytes_in_order() {
        let source = ByteSource::chunked(&b"the quick brown fox"[..], 4);
        let mut sink = BufferSink::new(usize::MAX);

        let stats = StreamBridge::new().transfer(source, &mut sink).await.unwrap();
        assert_eq!(sink.written(), b"the quick brown fox");
        assert_eq!(stats.bytes, 19);
        assert_eq!(stats.chunks, 5);
        assert_eq!(stats.pauses, 0);
    }

    #[tokio::test]
    async fn consumed_source_fails_before_any_write() {
        let mut source = ByteSource::buffer(&b"data"[..]);
        source.mark_consumed();
        let mut sink = BufferSink::new(usize::MAX);

        let err = StreamBridge::new().transfer(source, &mut sink).await.unwrap_err();
        assert!(matches!(err, TransferError::BodyAlreadyConsumed));
        assert!(sink.written().is_empty());
    }

    #[tokio::test]
    async fn sink_error_aborts_without_retracting() {
        let source = ByteSource::chunked(&b"abcdef"[..], 2);
        let mut sink = FailingSink {
            written: 0,
            fail_after: 2,
        };

        let err = StreamBridge::new().transfer(source, &mut sink).await.unwrap_err();
        assert!(matches!(err, TransferError::Sink(_)));
        // Two chunks were flushed before the failure and stay flushed.
        assert_eq!(sink.written, 2);
    }

    #[tokio::test]
    async fn aborted_push_source_propagates() {
        let (handle, source) = ByteSource::push();
        handle.abort("upstream timeout");
        let mut sink = BufferSink::new(usize::MAX);

        let err = StreamBridge::new().transfer(source, &mut sink).await.unwrap_err();
        assert!(matches!(err, TransferError::Source(SourceError::Aborted(_))));
    }

    #[tokio::test]
    async fn pauses_until_drain_fires() {
        // Watermark of 1 byte: every chunk overflows and forces a pause.
        let source = ByteSource::chunked(&b"xxyyzz"[..], 2);
        let mut sink = BufferSink::new(1);
        let signal = sink.drain_signal();

        let drainer = tokio::spawn(async move {
            loop {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                signal.raise();
            }
        });

        let stats = StreamBridge::new().transfer(source, &mut sink).await.unwrap();
        drainer.abort();

        assert_eq!(sink.written(), b"xxyyzz");
        assert_eq!(stats.pauses, 3);
    }

    #[tokio::test]
    async fn metrics_enabled_records_counters() {
        let increments = Arc::new(AtomicU64::new(0));
        let recorder = RecorderSpy {
            increments: Arc::clone(&increments),
        };
        let guard = ::metrics::set_default_local_recorder(&recorder);

        let source = ByteSource::chunked(&b"abcdef"[..], 2);
        let mut sink = BufferSink::new(usize::MAX);
        StreamBridge::new().transfer(source, &mut sink).await.unwrap();

        drop(guard);
        assert!(increments.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn metrics_disabled_records_nothing() {
        let increments = Arc::new(AtomicU64::new(0));
        let recorder = RecorderSpy {
            increments: Arc::clone(&increments),
        };
        let guard = ::metrics::set_default_local_recorder(&recorder);

        let source = ByteSource::chunked(&b"abcdef"[..], 2);
        let mut sink = BufferSink::new(usize::MAX);
        StreamBridge::new()
            .with_metrics(false)
            .transfer(source, &mut sink)
            .await
            .unwrap();

        // Error paths are gated too.
        let mut consumed = ByteSource::buffer(&b"gone"[..]);
        consumed.mark_consumed();
        let err = StreamBridge::new()
            .with_metrics(false)
            .transfer(consumed, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::BodyAlreadyConsumed));

        drop(guard);
        assert_eq!(increments.load(Ordering::SeqCst), 0);
    }
}
