//! Diagnostics notices
//!
//! Human-readable event stream for whatever presentation layer sits on top.
//! The core never assumes an execution context for display: notices go out
//! on a bounded channel and the pipeline never blocks on a slow or absent
//! consumer — when the channel is full the notice is dropped and counted.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::NOTICE_CHANNEL_CAPACITY;

/// One diagnostics event from the receiver core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Transport reported a connection
    Connected,
    /// Transport reported a disconnection; the pipeline was reset
    Disconnected,
    /// Streaming started; blocks are now accepted into the pipeline
    StreamingStarted,
    /// A block's tag did not match the expected sequence ("a packet got dropped")
    PacketDropped { expected: u8, got: u8 },
    /// A block arrived with the wrong payload length and was refused pre-decode
    MalformedBlock { len: usize, expected: usize },
    /// The codec refused a well-formed block; the frame was dropped
    DecodeFailed { detail: String },
    /// The fault policy tripped and the codec session was reinitialized
    SessionReset { consecutive_faults: u32 },
    /// The playback queue was full and refused a decoded frame
    QueueOverflow,
    /// The audio sink failed to start; streaming was not entered
    SinkFailed { detail: String },
    /// Periodic mean inter-arrival, emitted every 64 accepted frames
    Latency { mean: Duration, degraded: bool },
}

/// Sending half owned by the pipeline
#[derive(Clone)]
pub struct NoticeBus {
    tx: Sender<Notice>,
    dropped: Arc<AtomicUsize>,
}

impl NoticeBus {
    /// Emit a notice without ever blocking the producer path
    pub fn emit(&self, notice: Notice) {
        match self.tx.try_send(notice) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Notices dropped because nobody was draining the channel
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a notice channel with the default capacity
pub fn notice_channel() -> (NoticeBus, Receiver<Notice>) {
    notice_channel_with_capacity(NOTICE_CHANNEL_CAPACITY)
}

/// Create a notice channel with an explicit capacity
pub fn notice_channel_with_capacity(capacity: usize) -> (NoticeBus, Receiver<Notice>) {
    let (tx, rx) = bounded(capacity);
    (
        NoticeBus {
            tx,
            dropped: Arc::new(AtomicUsize::new(0)),
        },
        rx,
    )
}
