//! cpal-backed audio output
//!
//! Builds an f32 output stream on the default device and services its
//! callback straight from the shared playback queue. The callback never
//! blocks: an empty queue yields silence for that slice and is counted as
//! an underrun by the queue itself.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::audio::AudioSink;
use crate::config::StreamConfig;
use crate::error::SinkError;
use crate::playback::PlaybackQueue;

/// Partially consumed frame carried across output callbacks.
///
/// The device buffer size and the frame size are unrelated, so a frame
/// regularly straddles two callbacks.
pub(crate) struct FrameCarry {
    samples: Vec<i16>,
    cursor: usize,
}

impl FrameCarry {
    pub(crate) fn new() -> Self {
        Self {
            samples: Vec::new(),
            cursor: 0,
        }
    }

    fn exhausted(&self) -> bool {
        self.cursor >= self.samples.len()
    }
}

/// Fill one output buffer from the queue, duplicating mono to every output
/// channel and zero-filling whatever the queue cannot cover.
pub(crate) fn fill_output(
    data: &mut [f32],
    out_channels: usize,
    carry: &mut FrameCarry,
    queue: &PlaybackQueue,
) {
    for slot in data.chunks_mut(out_channels) {
        if carry.exhausted() {
            match queue.pop() {
                Some(frame) => {
                    carry.samples = frame.samples;
                    carry.cursor = 0;
                }
                None => {
                    // Underrun: silence for the rest of this slice.
                    slot.fill(0.0);
                    continue;
                }
            }
        }
        let sample = carry.samples[carry.cursor] as f32 / 32768.0;
        carry.cursor += 1;
        slot.fill(sample);
    }
}

/// Real-time output sink on the default cpal device
pub struct CpalOutput {
    queue: Arc<PlaybackQueue>,
    sample_rate: u32,
    stream: Option<cpal::Stream>,
}

impl CpalOutput {
    /// Create a sink that will pull from `queue` once started
    pub fn new(config: &StreamConfig, queue: Arc<PlaybackQueue>) -> Self {
        Self {
            queue,
            sample_rate: config.sample_rate,
            stream: None,
        }
    }

    fn build_stream(&self) -> Result<cpal::Stream, SinkError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(SinkError::NoDevice)?;
        let default_config = device
            .default_output_config()
            .map_err(|e| SinkError::StreamError(e.to_string()))?;

        if default_config.sample_format() != cpal::SampleFormat::F32 {
            return Err(SinkError::UnsupportedFormat(format!(
                "{:?}",
                default_config.sample_format()
            )));
        }

        let channels = default_config.channels();
        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".into()),
            channels,
            sample_rate = self.sample_rate,
            "opening output stream"
        );

        let queue = self.queue.clone();
        let mut carry = FrameCarry::new();
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _| {
                    fill_output(data, channels as usize, &mut carry, &queue);
                },
                |e| error!("output stream error: {}", e),
                None,
            )
            .map_err(|e| SinkError::StreamError(e.to_string()))?;

        Ok(stream)
    }
}

impl AudioSink for CpalOutput {
    fn start(&mut self) -> Result<(), SinkError> {
        if self.stream.is_some() {
            debug!("sink already running");
            return Ok(());
        }
        let stream = self.build_stream()?;
        stream
            .play()
            .map_err(|e| SinkError::StartFailed(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            // Pause before drop so the callback stops pulling immediately.
            if let Err(e) = stream.pause() {
                debug!("pause on stop failed: {}", e);
            }
            info!("output stream stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::DecodedFrame;

    #[test]
    fn fill_duplicates_mono_to_channels() {
        let queue = PlaybackQueue::new(4);
        queue.enqueue(DecodedFrame::new(vec![16384, -16384]));

        let mut carry = FrameCarry::new();
        let mut data = [9.0f32; 4]; // 2 stereo slots
        fill_output(&mut data, 2, &mut carry, &queue);

        assert_eq!(data[0], 0.5);
        assert_eq!(data[1], 0.5);
        assert_eq!(data[2], -0.5);
        assert_eq!(data[3], -0.5);
    }

    #[test]
    fn underrun_yields_silence() {
        let queue = PlaybackQueue::new(4);
        let mut carry = FrameCarry::new();
        let mut data = [9.0f32; 6];
        fill_output(&mut data, 2, &mut carry, &queue);

        assert!(data.iter().all(|&s| s == 0.0));
        assert!(queue.underrun_count() > 0);
    }

    #[test]
    fn frame_straddles_callbacks() {
        let queue = PlaybackQueue::new(4);
        queue.enqueue(DecodedFrame::new(vec![100, 200, 300]));

        let mut carry = FrameCarry::new();
        let mut first = [0.0f32; 2];
        fill_output(&mut first, 1, &mut carry, &queue);
        let mut second = [9.0f32; 2];
        fill_output(&mut second, 1, &mut carry, &queue);

        assert_eq!(first[0], 100.0 / 32768.0);
        assert_eq!(first[1], 200.0 / 32768.0);
        assert_eq!(second[0], 300.0 / 32768.0);
        // Queue exhausted mid-buffer: the tail is silence.
        assert_eq!(second[1], 0.0);
    }
}
