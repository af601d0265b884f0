//! Bounded buffer of recent samples

use std::collections::VecDeque;
use vibewatch_types::Sample;

/// Default number of samples retained.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Fixed-capacity FIFO of the most recent samples, oldest first.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl SampleBuffer {
    /// Create an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn extend<I: IntoIterator<Item = Sample>>(&mut self, samples: I) {
        for sample in samples {
            self.push(sample);
        }
    }

    /// Copy of up to `limit` most recent samples in arrival order.
    pub fn recent(&self, limit: usize) -> Vec<Sample> {
        let skip = self.samples.len().saturating_sub(limit);
        self.samples.iter().skip(skip).copied().collect()
    }

    /// Copy of the whole buffer in arrival order.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }
}
