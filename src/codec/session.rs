//! Stateful decoder session
//!
//! Wraps one opaque Opus decoder handle behind a safe owning type. The
//! decoder is stateful: decoding block N may draw on history from block N-1
//! (packet-loss concealment), which is exactly why [`CodecSession::reset`]
//! must run whenever a connection ends.

use opus::{Channels, Decoder};
use tracing::debug;

use crate::block::{CompressedBlock, DecodedFrame};
use crate::config::StreamConfig;
use crate::error::DecodeError;

/// Exclusive owner of one decoder handle and its PCM scratch buffer.
///
/// Exactly one block is in flight through a session at a time; `decode`
/// takes `&mut self` so the type system enforces that.
pub struct CodecSession {
    decoder: Decoder,
    block_size: usize,
    frame_samples: usize,
    /// Decode output buffer (reused to avoid per-call allocation)
    pcm: Vec<i16>,
    /// Frames decoded since construction or last stats reset
    frames_decoded: u64,
    /// Decode calls that ended in a codec fault
    faults: u64,
}

impl CodecSession {
    /// Create a session for the configured rate and frame duration.
    ///
    /// Acquires the codec's working memory; dropping the session releases it
    /// on every exit path, including failure part-way through setup.
    pub fn new(config: &StreamConfig) -> Result<Self, DecodeError> {
        let decoder = Decoder::new(config.sample_rate, Channels::Mono)
            .map_err(|e| DecodeError::SessionInit(e.to_string()))?;

        let frame_samples = config.frame_samples();

        Ok(Self {
            decoder,
            block_size: config.block_size(),
            frame_samples,
            pcm: vec![0i16; frame_samples],
            frames_decoded: 0,
            faults: 0,
        })
    }

    /// Decode one compressed block into one PCM frame.
    ///
    /// A wrong-sized payload is rejected before the codec is touched and
    /// leaves decoder history untouched. A codec fault leaves history as the
    /// library left it; the caller decides whether to reset the session.
    pub fn decode(&mut self, block: &CompressedBlock) -> Result<DecodedFrame, DecodeError> {
        if block.payload.len() != self.block_size {
            return Err(DecodeError::WrongSize {
                expected: self.block_size,
                got: block.payload.len(),
            });
        }

        let produced = self
            .decoder
            .decode(&block.payload, &mut self.pcm, false)
            .map_err(|e| {
                self.faults += 1;
                DecodeError::CodecFault(e.to_string())
            })?;

        // The stream is fixed-format; a well-formed block always fills the
        // frame exactly. Anything else is a fault, never a partial frame.
        if produced != self.frame_samples {
            self.faults += 1;
            return Err(DecodeError::CodecFault(format!(
                "decoder produced {} samples, expected {}",
                produced, self.frame_samples
            )));
        }

        self.frames_decoded += 1;
        Ok(DecodedFrame::new(self.pcm.clone()))
    }

    /// Reinitialize decoder history.
    ///
    /// Called on disconnect and by the fault policy so no concealment state
    /// carries over into the next stream.
    pub fn reset(&mut self) -> Result<(), DecodeError> {
        debug!("resetting codec session state");
        self.decoder
            .reset_state()
            .map_err(|e| DecodeError::SessionInit(e.to_string()))
    }

    /// Size in bytes of the blocks this session accepts
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Samples per decoded frame
    pub fn frame_samples(&self) -> usize {
        self.frame_samples
    }

    /// Frames successfully decoded
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Decode calls that ended in a codec fault
    pub fn faults(&self) -> u64 {
        self.faults
    }
}
