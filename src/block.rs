//! Block and frame types
//!
//! One [`CompressedBlock`] is one inbound transport notification; one
//! [`DecodedFrame`] is the PCM produced from exactly one block. Neither is
//! retained past its stage of the pipeline.

use bytes::Bytes;

/// One fixed-size unit of compressed audio as received from the transport.
///
/// Wire convention: the last byte of a received notification is the wrapping
/// sequence tag, the preceding bytes are the compressed payload.
#[derive(Debug, Clone)]
pub struct CompressedBlock {
    /// Compressed payload (expected length: the configured block size)
    pub payload: Bytes,
    /// Wrapping sequence tag assigned by the sender
    pub sequence_tag: u8,
}

impl CompressedBlock {
    /// Split one inbound notification into payload and trailing tag byte.
    ///
    /// Returns `None` only for an empty notification; payload length is
    /// validated against the configured block size by the pipeline, not here.
    pub fn from_wire(data: &[u8]) -> Option<Self> {
        let (&sequence_tag, payload) = data.split_last()?;
        Some(Self {
            payload: Bytes::copy_from_slice(payload),
            sequence_tag,
        })
    }
}

/// One fixed-size unit of decoded mono s16 PCM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// PCM samples, always exactly the configured frame length
    pub samples: Vec<i16>,
}

impl DecodedFrame {
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    /// Number of samples in the frame
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Frame duration in microseconds at the given sample rate
    pub fn duration_us(&self, sample_rate: u32) -> u64 {
        (self.samples.len() as u64 * 1_000_000) / sample_rate as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_split_takes_trailing_tag() {
        let mut data = vec![0xABu8; 40];
        data.push(7);

        let block = CompressedBlock::from_wire(&data).unwrap();
        assert_eq!(block.sequence_tag, 7);
        assert_eq!(block.payload.len(), 40);
        assert!(block.payload.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn wire_rejects_empty_notification() {
        assert!(CompressedBlock::from_wire(&[]).is_none());
    }

    #[test]
    fn tag_only_notification_has_empty_payload() {
        let block = CompressedBlock::from_wire(&[42]).unwrap();
        assert_eq!(block.sequence_tag, 42);
        assert!(block.payload.is_empty());
    }

    #[test]
    fn frame_duration() {
        let frame = DecodedFrame::new(vec![0; 480]);
        assert_eq!(frame.duration_us(48_000), 10_000);
    }
}
