//! Bounded drop-oldest FIFO used to hold audio frames while a peer is not
//! ready to receive them.

use std::collections::VecDeque;

/// A fixed-capacity queue that evicts its oldest entry instead of growing or
/// blocking when full.
#[derive(Debug, Clone)]
pub struct FrameBuffer<T> {
    frames: VecDeque<T>,
    capacity: usize,
    dropped: u64,
}

impl<T> FrameBuffer<T> {
    /// Creates an empty buffer. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Appends a frame, evicting the oldest one first if the buffer is full.
    pub fn enqueue(&mut self, frame: T) {
        if self.frames.len() >= self.capacity {
            self.frames.pop_front();
            self.dropped += 1;
        }
        self.frames.push_back(frame);
    }

    /// Hands every queued frame to `sink` in arrival order, leaving the buffer empty.
    pub fn drain_to<F>(&mut self, mut sink: F)
    where
        F: FnMut(T),
    {
        while let Some(frame) = self.frames.pop_front() {
            sink(frame);
        }
    }

    /// Discards every queued frame. Returns how many were discarded.
    pub fn clear(&mut self) -> usize {
        let cleared = self.frames.len();
        self.frames.clear();
        cleared
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total frames evicted by overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_arrival_order_and_empties() {
        let mut buffer = FrameBuffer::new(4);
        for i in 0..3 {
            buffer.enqueue(i);
        }

        let mut out = Vec::new();
        buffer.drain_to(|frame| out.push(frame));

        assert_eq!(out, vec![0, 1, 2]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut buffer = FrameBuffer::new(3);
        for i in 0..5 {
            buffer.enqueue(i);
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.dropped(), 2);

        let mut out = Vec::new();
        buffer.drain_to(|frame| out.push(frame));
        assert_eq!(out, vec![2, 3, 4]);
    }

    #[test]
    fn clear_reports_discarded_count() {
        let mut buffer = FrameBuffer::new(10);
        buffer.enqueue("a");
        buffer.enqueue("b");

        assert_eq!(buffer.clear(), 2);
        assert!(buffer.is_empty());
        assert_eq!(buffer.dropped(), 0);
    }

    #[test]
    fn zero_capacity_still_holds_latest_frame() {
        let mut buffer = FrameBuffer::new(0);
        buffer.enqueue(1);
        buffer.enqueue(2);

        assert_eq!(buffer.capacity(), 1);
        let mut out = Vec::new();
        buffer.drain_to(|frame| out.push(frame));
        assert_eq!(out, vec![2]);
    }
}
