//! Fixed-capacity circular store for the incoming signed 8-bit stream

use crate::error::{ModemError, Result};

/// Circular byte store that overwrites its oldest samples once full.
///
/// `len()` is always within `0..=capacity()`.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: Box<[i8]>,
    write_pos: usize,
    len: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ModemError::InvalidConfig(
                "ring buffer capacity must be positive".into(),
            ));
        }
        Ok(Self {
            data: vec![0i8; capacity].into_boxed_slice(),
            write_pos: 0,
            len: 0,
        })
    }

    /// Append samples, evicting the oldest ones when capacity is exceeded
    pub fn write(&mut self, samples: &[i8]) {
        let capacity = self.capacity();

        // Only the newest `capacity` samples can survive this write.
        let samples = &samples[samples.len().saturating_sub(capacity)..];

        let first = samples.len().min(capacity - self.write_pos);
        self.data[self.write_pos..self.write_pos + first].copy_from_slice(&samples[..first]);
        let rest = samples.len() - first;
        self.data[..rest].copy_from_slice(&samples[first..]);

        self.write_pos = (self.write_pos + samples.len()) % capacity;
        self.len = self.len.saturating_add(samples.len()).min(capacity);
    }

    /// Copy out up to `n` of the oldest stored samples in chronological order
    /// without consuming them
    pub fn peek(&self, n: usize) -> Vec<i8> {
        let capacity = self.capacity();
        let n = n.min(self.len);
        let read_pos = (self.write_pos + capacity - self.len) % capacity;

        let first = n.min(capacity - read_pos);
        let mut out = Vec::with_capacity(n);
        out.extend_from_slice(&self.data[read_pos..read_pos + first]);
        out.extend_from_slice(&self.data[..n - first]);
        out
    }

    /// Copy out everything stored, oldest first
    pub fn peek_all(&self) -> Vec<i8> {
        self.peek(self.len)
    }

    /// Forget all stored samples
    pub fn reset(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}
