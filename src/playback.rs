//! Playback queue
//!
//! The only structure shared between the producer (decode) and consumer
//! (audio sink callback) timing domains. Lock-free and bounded: the sink's
//! pull path never waits on decode work, and a stalled sink cannot grow the
//! queue without bound — a full queue refuses the newest frame and counts
//! the overflow.

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::block::DecodedFrame;

/// Bounded FIFO of decoded frames awaiting playback
pub struct PlaybackQueue {
    queue: ArrayQueue<DecodedFrame>,
    overflow_count: AtomicUsize,
    underrun_count: AtomicUsize,
}

impl PlaybackQueue {
    /// Create a queue holding at most `capacity` frames
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
            overflow_count: AtomicUsize::new(0),
            underrun_count: AtomicUsize::new(0),
        }
    }

    /// Create a queue shared between the producer and consumer domains
    pub fn shared(capacity: usize) -> Arc<Self> {
        Arc::new(Self::new(capacity))
    }

    /// Append a frame to the tail.
    ///
    /// Returns `false` if the queue is full; the frame is refused (newest
    /// loses) and the overflow counter advances.
    pub fn enqueue(&self, frame: DecodedFrame) -> bool {
        match self.queue.push(frame) {
            Ok(()) => true,
            Err(_) => {
                self.overflow_count.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Dequeue the next frame, never blocking.
    ///
    /// `None` is an underrun: the sink asked for audio the producer has not
    /// delivered yet. The sink plays silence for that slice.
    pub fn pop(&self) -> Option<DecodedFrame> {
        match self.queue.pop() {
            Some(frame) => Some(frame),
            None => {
                self.underrun_count.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Dequeue up to `max_frames` frames in FIFO order, never blocking.
    ///
    /// An empty queue yields an empty vec (one counted underrun), not an
    /// error.
    pub fn pull(&self, max_frames: usize) -> Vec<DecodedFrame> {
        let mut frames = Vec::with_capacity(max_frames.min(self.queue.len()));
        while frames.len() < max_frames {
            match self.queue.pop() {
                Some(frame) => frames.push(frame),
                None => break,
            }
        }
        if frames.is_empty() && max_frames > 0 {
            self.underrun_count.fetch_add(1, Ordering::Relaxed);
        }
        frames
    }

    /// Empty the queue immediately and unconditionally.
    ///
    /// Safe to call while the other side is mid-enqueue/pull; afterwards
    /// both sides observe an empty queue until new frames arrive.
    pub fn reset(&self) {
        while self.queue.pop().is_some() {}
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Frames refused because the queue was full
    pub fn overflow_count(&self) -> usize {
        self.overflow_count.load(Ordering::Relaxed)
    }

    /// Pulls that found the queue empty
    pub fn underrun_count(&self) -> usize {
        self.underrun_count.load(Ordering::Relaxed)
    }

    /// Reset statistics counters (not the queue contents)
    pub fn reset_stats(&self) {
        self.overflow_count.store(0, Ordering::Relaxed);
        self.underrun_count.store(0, Ordering::Relaxed);
    }
}
