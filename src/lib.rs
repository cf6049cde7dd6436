//! # BLE Audio Receiver
//!
//! Low-latency receiver core for a fixed-size compressed audio stream
//! delivered over a wireless link. Reconstructs a gapless PCM timeline from
//! tagged blocks and feeds it to a real-time output sink while tracking
//! packet loss and inter-arrival latency.
//!
//! ## Architecture Overview
//!
//! ```text
//!  transport notification           producer timing domain
//!  (payload ‖ tag byte)                       │
//!        │                                    ▼
//!        │           ┌─────────────────────────────────────────┐
//!        └──────────▶│            StreamPipeline               │
//!                    │  ┌─────────────┐    ┌──────────────┐    │
//!                    │  │ Sequence    │───▶│ CodecSession │    │
//!                    │  │ Tracker     │    │ (Opus, s16)  │    │
//!                    │  └─────────────┘    └──────┬───────┘    │
//!                    │   tag match / drop         │            │
//!                    └────────────────────────────┼────────────┘
//!                                                 │ DecodedFrame
//!                                                 ▼
//!                                       ┌──────────────────┐
//!                                       │  PlaybackQueue   │  lock-free,
//!                                       │  (bounded FIFO)  │  bounded
//!                                       └────────┬─────────┘
//!                                                │ pop (never blocks)
//!                                                ▼
//!                                       ┌──────────────────┐
//!                                       │  AudioSink       │  consumer
//!                                       │  (cpal callback) │  timing domain
//!                                       └──────────────────┘
//! ```
//!
//! The `StreamPipeline` state machine (`Disconnected | Connected | Streaming`)
//! gates the whole path and owns every lifecycle reset. Diagnostics leave the
//! core as [`events::Notice`] values on a bounded channel; no UI or transport
//! code lives here.

pub mod audio;
pub mod block;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod playback;
pub mod sequencer;
pub mod stream;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    use std::time::Duration;

    /// Default sample rate for decoded PCM
    pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

    /// Default stream bitrate in bits per second
    pub const DEFAULT_BITRATE: u32 = 128_000;

    /// Default frame duration in microseconds
    pub const DEFAULT_FRAME_DURATION_US: u32 = 10_000;

    /// Sequence tag modulus (the tag is a wrapping u8)
    pub const TAG_MODULUS: usize = 256;

    /// Accepted-frame interval between latency reports
    pub const LATENCY_REPORT_INTERVAL: u64 = 64;

    /// Mean inter-arrival at or above this is reported as degraded timing
    pub const DEFAULT_DEGRADED_LATENCY: Duration = Duration::from_millis(10);

    /// Playback queue capacity (in frames)
    pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

    /// Consecutive codec faults tolerated before the session is reset
    pub const DEFAULT_MAX_CONSECUTIVE_FAULTS: u32 = 3;

    /// Capacity of the diagnostics notice channel
    pub const NOTICE_CHANNEL_CAPACITY: usize = 128;
}
