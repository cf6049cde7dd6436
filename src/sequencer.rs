//! Frame sequencer
//!
//! Validates the wrapping sequence tag on each inbound block and keeps a
//! rolling inter-arrival ring for latency diagnostics. Loss is detected,
//! never repaired: a tag mismatch refuses the block and leaves the tracker
//! where it was, so the producer has to resynchronize externally (in
//! practice, by reconnecting). A loss burst longer than the tag modulus is
//! indistinguishable from a shorter one; the tracker just keeps refusing
//! until the next reconnect resets it.

use std::time::{Duration, Instant};

use crate::constants::{LATENCY_REPORT_INTERVAL, TAG_MODULUS};

/// Outcome of offering one block to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitResult {
    /// Tag matched; the tracker advanced and recorded the inter-arrival.
    Accepted {
        seq: u8,
        inter_arrival: Duration,
    },
    /// Tag mismatch; tracker state is unchanged.
    Dropped { expected: u8, got: u8 },
}

/// Sequence-tag tracker with a per-tag inter-arrival ring.
///
/// Owned and mutated only on the producer side.
pub struct SequenceTracker {
    /// Next tag expected; advances only on an exact match
    expected_tag: u8,
    /// Arrival time of the previous accepted block (or the stream start)
    last_arrival: Instant,
    /// Inter-arrival durations indexed by tag
    ring: [Duration; TAG_MODULUS],
    /// Ring slots written so far, saturating at the modulus
    filled: usize,
    /// Blocks accepted since the last reset
    accepted: u64,
    /// Blocks refused since the last reset
    dropped: u64,
    /// Set every `LATENCY_REPORT_INTERVAL` accepted frames
    report_due: bool,
}

impl SequenceTracker {
    /// Create a tracker; `start` anchors the first inter-arrival measurement.
    pub fn new(start: Instant) -> Self {
        Self {
            expected_tag: 0,
            last_arrival: start,
            ring: [Duration::ZERO; TAG_MODULUS],
            filled: 0,
            accepted: 0,
            dropped: 0,
            report_due: false,
        }
    }

    /// Reset to tag 0 with a fresh timing baseline. Called on every entry to
    /// the streaming state.
    pub fn reset(&mut self, at: Instant) {
        *self = Self::new(at);
    }

    /// Offer one block's tag to the tracker.
    pub fn admit(&mut self, tag: u8, arrival: Instant) -> AdmitResult {
        if tag != self.expected_tag {
            self.dropped += 1;
            return AdmitResult::Dropped {
                expected: self.expected_tag,
                got: tag,
            };
        }

        let inter_arrival = arrival.saturating_duration_since(self.last_arrival);
        self.ring[self.expected_tag as usize] = inter_arrival;
        if self.filled < TAG_MODULUS {
            self.filled += 1;
        }

        self.last_arrival = arrival;
        self.accepted += 1;
        if self.accepted % LATENCY_REPORT_INTERVAL == 0 {
            self.report_due = true;
        }

        let seq = self.expected_tag;
        self.expected_tag = self.expected_tag.wrapping_add(1);
        AdmitResult::Accepted { seq, inter_arrival }
    }

    /// Take the periodic latency report if one is due.
    ///
    /// Becomes available once every 64 accepted frames and reports the mean
    /// over the whole populated ring, not just the last interval.
    pub fn take_latency_report(&mut self) -> Option<Duration> {
        if self.report_due {
            self.report_due = false;
            Some(self.mean_inter_arrival())
        } else {
            None
        }
    }

    /// Mean inter-arrival over the populated portion of the ring
    pub fn mean_inter_arrival(&self) -> Duration {
        if self.filled == 0 {
            return Duration::ZERO;
        }
        let total: Duration = self.ring[..].iter().sum();
        total / self.filled as u32
    }

    /// Next tag the tracker will accept
    pub fn expected_tag(&self) -> u8 {
        self.expected_tag
    }

    /// Blocks accepted since the last reset
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Blocks refused since the last reset
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Inter-arrival recorded for a given tag (diagnostics)
    pub fn inter_arrival_for(&self, tag: u8) -> Duration {
        self.ring[tag as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn in_order_tags_advance() {
        let base = Instant::now();
        let mut tracker = SequenceTracker::new(base);

        for i in 0u64..10 {
            let arrival = at(base, (i + 1) * 5);
            match tracker.admit(i as u8, arrival) {
                AdmitResult::Accepted { seq, inter_arrival } => {
                    assert_eq!(seq, i as u8);
                    assert_eq!(inter_arrival, Duration::from_millis(5));
                }
                AdmitResult::Dropped { .. } => panic!("tag {} refused", i),
            }
        }
        assert_eq!(tracker.expected_tag(), 10);
        assert_eq!(tracker.accepted(), 10);
        // Recorded at the pre-advance index.
        assert_eq!(tracker.inter_arrival_for(0), Duration::from_millis(5));
    }

    #[test]
    fn mismatch_leaves_tracker_unchanged() {
        let base = Instant::now();
        let mut tracker = SequenceTracker::new(base);

        tracker.admit(0, at(base, 5));
        let result = tracker.admit(9, at(base, 10));
        assert_eq!(result, AdmitResult::Dropped { expected: 1, got: 9 });
        assert_eq!(tracker.expected_tag(), 1);
        assert_eq!(tracker.accepted(), 1);
        assert_eq!(tracker.dropped(), 1);
        // The refused block must not disturb the timing baseline either.
        match tracker.admit(1, at(base, 15)) {
            AdmitResult::Accepted { inter_arrival, .. } => {
                assert_eq!(inter_arrival, Duration::from_millis(10));
            }
            AdmitResult::Dropped { .. } => panic!("in-order tag refused"),
        }
    }

    #[test]
    fn lost_packet_scenario() {
        // Tags [0, 1, 2, 4] with 3 never arriving.
        let base = Instant::now();
        let mut tracker = SequenceTracker::new(base);
        let results: Vec<bool> = [0u8, 1, 2, 4]
            .iter()
            .enumerate()
            .map(|(i, &tag)| {
                matches!(
                    tracker.admit(tag, at(base, (i as u64 + 1) * 5)),
                    AdmitResult::Accepted { .. }
                )
            })
            .collect();
        assert_eq!(results, vec![true, true, true, false]);
        assert_eq!(tracker.expected_tag(), 3);
    }

    #[test]
    fn full_cycle_wraps_to_zero() {
        let base = Instant::now();
        let mut tracker = SequenceTracker::new(base);
        for i in 0u64..256 {
            let result = tracker.admit(i as u8, at(base, (i + 1) * 5));
            assert!(matches!(result, AdmitResult::Accepted { .. }));
        }
        assert_eq!(tracker.expected_tag(), 0);
        assert_eq!(tracker.accepted(), 256);
    }

    #[test]
    fn latency_report_every_64_accepted() {
        let base = Instant::now();
        let mut tracker = SequenceTracker::new(base);

        for i in 0u64..63 {
            tracker.admit(i as u8, at(base, (i + 1) * 5));
            assert_eq!(tracker.take_latency_report(), None);
        }
        tracker.admit(63, at(base, 64 * 5));
        // 64 frames at a constant 5 ms spacing report a 5 ms mean.
        assert_eq!(tracker.take_latency_report(), Some(Duration::from_millis(5)));
        // One-shot until the next interval.
        assert_eq!(tracker.take_latency_report(), None);
    }

    #[test]
    fn reset_restores_initial_state() {
        let base = Instant::now();
        let mut tracker = SequenceTracker::new(base);
        for i in 0u64..70 {
            tracker.admit(i as u8, at(base, (i + 1) * 5));
        }
        tracker.take_latency_report();

        let restart = at(base, 1000);
        tracker.reset(restart);
        assert_eq!(tracker.expected_tag(), 0);
        assert_eq!(tracker.accepted(), 0);
        assert_eq!(tracker.mean_inter_arrival(), Duration::ZERO);
        assert_eq!(tracker.take_latency_report(), None);

        match tracker.admit(0, at(base, 1005)) {
            AdmitResult::Accepted { inter_arrival, .. } => {
                assert_eq!(inter_arrival, Duration::from_millis(5));
            }
            AdmitResult::Dropped { .. } => panic!("tag 0 refused after reset"),
        }
    }

    proptest! {
        /// The tracker advances exactly once per tag that matched at offer
        /// time, regardless of the input sequence.
        #[test]
        fn advances_only_on_exact_match(tags in proptest::collection::vec(any::<u8>(), 1..512)) {
            let base = Instant::now();
            let mut tracker = SequenceTracker::new(base);
            let mut expected = 0u8;
            let mut accepted = 0u64;

            for (i, &tag) in tags.iter().enumerate() {
                let arrival = at(base, i as u64 + 1);
                let result = tracker.admit(tag, arrival);
                if tag == expected {
                    prop_assert!(
                        matches!(result, AdmitResult::Accepted { seq, .. } if seq == tag),
                        "expected Accepted with seq == tag"
                    );
                    expected = expected.wrapping_add(1);
                    accepted += 1;
                } else {
                    prop_assert_eq!(result, AdmitResult::Dropped { expected, got: tag });
                }
                prop_assert_eq!(tracker.expected_tag(), expected);
            }
            prop_assert_eq!(tracker.accepted(), accepted);
        }
    }
}
