//! Stream state machine
//!
//! Top-level controller gating the decode/playback pipeline. All component
//! resets are ordered from here and nowhere else, so cross-component
//! invariants (tag 0 on streaming entry, empty queue after leaving
//! streaming, fresh concealment history per connection) hold by
//! construction.
//!
//! Per-block errors are contained here: a malformed, out-of-sequence, or
//! undecodable block produces a notice and the pipeline moves on to the
//! next block. Only a transport disconnect resets the whole pipeline.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::audio::AudioSink;
use crate::block::CompressedBlock;
use crate::codec::CodecSession;
use crate::config::StreamConfig;
use crate::error::{DecodeError, Error};
use crate::events::{Notice, NoticeBus};
use crate::playback::PlaybackQueue;
use crate::sequencer::{AdmitResult, SequenceTracker};

/// Connection/streaming state. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connected,
    Streaming,
}

/// The owned receiver pipeline: codec session, sequencer, playback queue and
/// sink controls behind one state machine.
///
/// Producer-side only: the transport calls [`handle_notification`] and the
/// connection signals from whatever thread delivers them, serialized by the
/// `&mut self` receiver. The audio sink shares nothing with this type but
/// the lock-free queue.
///
/// [`handle_notification`]: StreamPipeline::handle_notification
pub struct StreamPipeline<S: AudioSink> {
    config: StreamConfig,
    state: StreamState,
    session: CodecSession,
    tracker: SequenceTracker,
    queue: Arc<PlaybackQueue>,
    sink: S,
    notices: NoticeBus,
    consecutive_faults: u32,
}

impl<S: AudioSink> StreamPipeline<S> {
    /// Build a pipeline around an already-wired sink and the queue it pulls
    /// from.
    pub fn new(
        config: StreamConfig,
        queue: Arc<PlaybackQueue>,
        sink: S,
        notices: NoticeBus,
    ) -> Result<Self, Error> {
        config.validate()?;
        let session = CodecSession::new(&config)?;
        Ok(Self {
            config,
            state: StreamState::Disconnected,
            session,
            tracker: SequenceTracker::new(Instant::now()),
            queue,
            sink,
            notices,
            consecutive_faults: 0,
        })
    }

    /// Current state
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Shared playback queue (for wiring additional consumers/diagnostics)
    pub fn queue(&self) -> &Arc<PlaybackQueue> {
        &self.queue
    }

    /// Sequencer diagnostics
    pub fn tracker(&self) -> &SequenceTracker {
        &self.tracker
    }

    /// Transport reported a successful connection.
    pub fn handle_connect(&mut self) {
        info!("transport connected");
        self.sink.stop();
        self.queue.reset();
        self.state = StreamState::Connected;
        self.notices.emit(Notice::Connected);
    }

    /// Transport reported a disconnection (or explicit cleanup).
    ///
    /// Valid from any state; resets the full pipeline.
    pub fn handle_disconnect(&mut self) {
        info!("transport disconnected, resetting pipeline");
        self.sink.stop();
        self.queue.reset();
        self.tracker.reset(Instant::now());
        if let Err(e) = self.session.reset() {
            warn!("codec session reset failed: {}", e);
        }
        self.consecutive_faults = 0;
        self.state = StreamState::Disconnected;
        self.notices.emit(Notice::Disconnected);
    }

    /// Operator start action: begin streaming.
    ///
    /// Only valid from `Connected`. If the sink refuses to start, the
    /// pipeline stays in `Connected` and the error is surfaced.
    pub fn start_streaming(&mut self, now: Instant) -> Result<(), Error> {
        if self.state != StreamState::Connected {
            debug!(state = ?self.state, "ignoring start request");
            return Ok(());
        }

        self.tracker.reset(now);
        self.consecutive_faults = 0;

        if let Err(e) = self.sink.start() {
            warn!("sink failed to start: {}", e);
            self.notices.emit(Notice::SinkFailed {
                detail: e.to_string(),
            });
            return Err(e.into());
        }

        self.state = StreamState::Streaming;
        info!("streaming");
        self.notices.emit(Notice::StreamingStarted);
        Ok(())
    }

    /// One inbound transport notification: trailing byte is the sequence
    /// tag, the rest is the compressed payload.
    ///
    /// Ignored outside `Streaming`. Never fails; every per-block problem is
    /// reported as a notice and the pipeline keeps going.
    pub fn handle_notification(&mut self, data: &[u8], arrival: Instant) {
        if self.state != StreamState::Streaming {
            debug!(state = ?self.state, "dropping notification outside streaming");
            return;
        }

        let Some(block) = CompressedBlock::from_wire(data) else {
            warn!("empty notification");
            self.notices.emit(Notice::MalformedBlock {
                len: 0,
                expected: self.config.block_size(),
            });
            return;
        };

        if block.payload.len() != self.config.block_size() {
            warn!(
                len = block.payload.len(),
                expected = self.config.block_size(),
                "malformed block refused before decode"
            );
            self.notices.emit(Notice::MalformedBlock {
                len: block.payload.len(),
                expected: self.config.block_size(),
            });
            return;
        }

        match self.tracker.admit(block.sequence_tag, arrival) {
            AdmitResult::Dropped { expected, got } => {
                debug!(expected, got, "a packet got dropped");
                self.notices.emit(Notice::PacketDropped { expected, got });
            }
            AdmitResult::Accepted { seq, .. } => {
                self.decode_and_enqueue(&block, seq);
            }
        }

        if let Some(mean) = self.tracker.take_latency_report() {
            let degraded = mean >= self.config.degraded_latency;
            if degraded {
                warn!(mean_us = mean.as_micros() as u64, "degraded inter-arrival timing");
            }
            self.notices.emit(Notice::Latency { mean, degraded });
        }
    }

    fn decode_and_enqueue(&mut self, block: &CompressedBlock, seq: u8) {
        match self.session.decode(block) {
            Ok(frame) => {
                self.consecutive_faults = 0;
                if !self.queue.enqueue(frame) {
                    debug!(seq, "playback queue full, frame refused");
                    self.notices.emit(Notice::QueueOverflow);
                }
            }
            Err(e @ DecodeError::WrongSize { .. }) => {
                // Length was validated above; reaching this means the
                // session was built for a different config.
                warn!(seq, "decode refused: {}", e);
                self.notices.emit(Notice::DecodeFailed {
                    detail: e.to_string(),
                });
            }
            Err(e) => {
                warn!(seq, "decode failed: {}", e);
                self.notices.emit(Notice::DecodeFailed {
                    detail: e.to_string(),
                });
                self.consecutive_faults += 1;
                self.apply_fault_policy();
            }
        }
    }

    /// After N consecutive codec faults the session history is suspect;
    /// reinitialize it rather than concealing from garbage.
    fn apply_fault_policy(&mut self) {
        let Some(limit) = self.config.max_consecutive_faults else {
            return;
        };
        if self.consecutive_faults < limit {
            return;
        }
        warn!(
            faults = self.consecutive_faults,
            "fault policy tripped, resetting codec session"
        );
        if let Err(e) = self.session.reset() {
            warn!("codec session reset failed: {}", e);
        }
        self.notices.emit(Notice::SessionReset {
            consecutive_faults: self.consecutive_faults,
        });
        self.consecutive_faults = 0;
    }
}
