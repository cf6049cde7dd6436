//! Audio sink boundary
//!
//! The sink runs in its own timing domain and pulls decoded frames from the
//! shared [`crate::playback::PlaybackQueue`] at its native cadence. The
//! state machine only sees the start/stop controls behind [`AudioSink`].

pub mod output;

pub use output::CpalOutput;

use crate::error::SinkError;

/// Start/stop controls the stream state machine drives.
///
/// Implementations pull from the shared playback queue on their own
/// callback thread; `start`/`stop` are called from the producer side.
pub trait AudioSink {
    /// Begin pulling frames and producing audio. Entering the streaming
    /// state is refused if this fails.
    fn start(&mut self) -> Result<(), SinkError>;

    /// Stop producing audio. Idempotent; called on every transition away
    /// from streaming.
    fn stop(&mut self);

    /// Whether the sink is currently running
    fn is_running(&self) -> bool;
}
