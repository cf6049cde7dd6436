//! Stream configuration
//!
//! One fixed stream format per session: constant bitrate, fixed frame
//! duration, mono s16 PCM. Block and frame sizes are derived, never stored,
//! so they cannot drift apart.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::*;
use crate::error::Error;

/// Configuration for one receiver session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Stream bitrate in bits per second
    pub bitrate: u32,

    /// Duration of one frame in microseconds
    pub frame_duration_us: u32,

    /// PCM sample rate in Hz
    pub sample_rate: u32,

    /// Playback queue capacity in frames
    pub queue_capacity: usize,

    /// Reset the codec session after this many consecutive codec faults.
    /// `None` keeps retrying without ever resetting.
    pub max_consecutive_faults: Option<u32>,

    /// Mean inter-arrival at or above this is flagged as degraded timing
    pub degraded_latency: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            bitrate: DEFAULT_BITRATE,
            frame_duration_us: DEFAULT_FRAME_DURATION_US,
            sample_rate: DEFAULT_SAMPLE_RATE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_consecutive_faults: Some(DEFAULT_MAX_CONSECUTIVE_FAULTS),
            degraded_latency: DEFAULT_DEGRADED_LATENCY,
        }
    }
}

impl StreamConfig {
    /// Size in bytes of one compressed block (excluding the trailing tag byte)
    pub fn block_size(&self) -> usize {
        (self.bitrate as u64 / 8 * self.frame_duration_us as u64 / 1_000_000) as usize
    }

    /// Number of PCM samples in one decoded frame
    pub fn frame_samples(&self) -> usize {
        (self.sample_rate as u64 * self.frame_duration_us as u64 / 1_000_000) as usize
    }

    /// Duration of one frame
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(self.frame_duration_us as u64)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the derived sizes are usable
    pub fn validate(&self) -> Result<(), Error> {
        if self.block_size() == 0 {
            return Err(Error::Config(format!(
                "bitrate {} / frame duration {}us derive an empty block",
                self.bitrate, self.frame_duration_us
            )));
        }
        if self.frame_samples() == 0 {
            return Err(Error::Config(format!(
                "sample rate {} / frame duration {}us derive an empty frame",
                self.sample_rate, self.frame_duration_us
            )));
        }
        if self.queue_capacity == 0 {
            return Err(Error::Config("queue capacity must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_derived_sizes() {
        let config = StreamConfig::default();
        // 128 kb/s over 10 ms frames, 48 kHz mono
        assert_eq!(config.block_size(), 160);
        assert_eq!(config.frame_samples(), 480);
        assert_eq!(config.frame_duration(), Duration::from_millis(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn small_block_config() {
        // 32 kb/s over 10 ms frames gives 40-byte blocks
        let config = StreamConfig {
            bitrate: 32_000,
            ..StreamConfig::default()
        };
        assert_eq!(config.block_size(), 40);
    }

    #[test]
    fn rejects_degenerate_config() {
        let config = StreamConfig {
            bitrate: 0,
            ..StreamConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let config = StreamConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: StreamConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.bitrate, config.bitrate);
        assert_eq!(parsed.queue_capacity, config.queue_capacity);
        assert_eq!(parsed.max_consecutive_faults, config.max_consecutive_faults);
    }
}
