//! Shared test harness: an instrumented sink with controllable drain.

use std::io;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use reply_stream::stream::{DrainSignal, Sink};

/// Everything observable about a sink from the outside, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// A chunk was written (its bytes).
    Write(Vec<u8>),
    /// The producer was paused (write reported over-capacity).
    Paused,
    /// The drain event resolved a pause.
    Resumed,
}

/// A sink with a byte-count capacity per pause period and an external
/// drain trigger, recording every observable event.
pub struct InstrumentedSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
    pending: usize,
    capacity: usize,
    signal: DrainSignal,
}

impl InstrumentedSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            pending: 0,
            capacity: capacity.max(1),
            signal: DrainSignal::new(),
        }
    }

    pub fn drain_signal(&self) -> DrainSignal {
        self.signal.clone()
    }

    pub fn events(&self) -> Arc<Mutex<Vec<SinkEvent>>> {
        Arc::clone(&self.events)
    }

    /// Concatenation of all written chunks, in write order.
    pub fn written(&self) -> Vec<u8> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

impl Sink for InstrumentedSink {
    fn write(&mut self, chunk: Bytes) -> Result<bool, io::Error> {
        let mut events = self.events.lock().unwrap();
        events.push(SinkEvent::Write(chunk.to_vec()));
        self.pending += chunk.len();
        let over = self.pending > self.capacity;
        if over {
            events.push(SinkEvent::Paused);
        }
        Ok(over)
    }

    async fn drained(&mut self) -> Result<(), io::Error> {
        self.signal.wait().await;
        self.pending = 0;
        self.events.lock().unwrap().push(SinkEvent::Resumed);
        Ok(())
    }
}

/// Spawn a task that keeps firing the drain signal until aborted.
pub fn auto_drain(signal: DrainSignal) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            signal.raise();
        }
    })
}

/// Every write after a pause must be preceded by a resume.
pub fn assert_backpressure_respected(events: &[SinkEvent]) {
    let mut paused = false;
    for event in events {
        match event {
            SinkEvent::Paused => paused = true,
            SinkEvent::Resumed => paused = false,
            SinkEvent::Write(_) => {
                assert!(!paused, "chunk written while producer should be paused");
            }
        }
    }
}
