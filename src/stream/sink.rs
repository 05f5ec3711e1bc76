//! Sink contract for the connection layer.
//!
//! # Responsibilities
//! - Accept chunks and report buffer pressure
//! - Signal "drained" exactly once per pause period
//!
//! # Design Decisions
//! - The sink owns all buffering; the bridge never queues chunks itself
//! - Drain is edge-triggered: one waiter per pause, resolved on the next
//!   drain event
//! - `DrainSignal` stores a permit, so a drain that fires between the
//!   capacity check and the wait is not lost

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Notify;

/// Abstract consumer of binary chunks with flow-control signaling.
///
/// Owned by the connection layer; a transfer holds it only for its own
/// duration, and only one transfer may be active per sink at a time.
#[allow(async_fn_in_trait)]
pub trait Sink: Send {
    /// Write one chunk. `Ok(true)` means the internal buffer is now over
    /// capacity and the caller must pause until [`Sink::drained`] resolves.
    fn write(&mut self, chunk: Bytes) -> Result<bool, io::Error>;

    /// Wait for the pending drain event. Called at most once per pause
    /// period, immediately after `write` returned `Ok(true)`.
    async fn drained(&mut self) -> Result<(), io::Error>;
}

/// One-shot drain waiter for sink implementations.
///
/// `notify_one` stores a permit when nobody is waiting yet, which closes
/// the race where pressure clears between the capacity check and waiter
/// registration.
#[derive(Debug, Clone, Default)]
pub struct DrainSignal {
    notify: Arc<Notify>,
}

impl DrainSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the drain event for the current pause period.
    pub fn raise(&self) {
        self.notify.notify_one();
    }

    /// Wait for the next drain event (or a stored permit).
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// A sink writing into an in-memory buffer, pausing the producer once the
/// buffer grows past a high watermark. Pressure clears when the owner
/// calls [`BufferSink::drain`].
///
/// This is the reference implementation of the [`Sink`] contract; real
/// connection layers wrap their socket the same way.
#[derive(Debug)]
pub struct BufferSink {
    buffer: Vec<u8>,
    pending: usize,
    high_watermark: usize,
    signal: DrainSignal,
}

impl BufferSink {
    /// Create a sink that reports over-capacity once more than
    /// `high_watermark` bytes are pending.
    pub fn new(high_watermark: usize) -> Self {
        Self {
            buffer: Vec::new(),
            pending: 0,
            high_watermark: high_watermark.max(1),
            signal: DrainSignal::new(),
        }
    }

    /// Mark pending bytes as flushed and fire the drain event if the
    /// producer was paused.
    pub fn drain(&mut self) {
        let was_over = self.pending > self.high_watermark;
        self.pending = 0;
        if was_over {
            self.signal.raise();
        }
    }

    /// Handle for draining from another task.
    pub fn drain_signal(&self) -> DrainSignal {
        self.signal.clone()
    }

    /// Everything written so far, in write order.
    pub fn written(&self) -> &[u8] {
        &self.buffer
    }
}

impl Sink for BufferSink {
    fn write(&mut self, chunk: Bytes) -> Result<bool, io::Error> {
        self.buffer.extend_from_slice(&chunk);
        self.pending += chunk.len();
        Ok(self.pending > self.high_watermark)
    }

    async fn drained(&mut self) -> Result<(), io::Error> {
        self.signal.wait().await;
        self.pending = 0;
        Ok(())
    }
}
