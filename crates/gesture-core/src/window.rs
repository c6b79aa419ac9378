//! Fixed-capacity rolling windows.

use std::collections::VecDeque;

/// A bounded FIFO that evicts its oldest sample when full.
///
/// Every sample gets a 1-based sequence number counted since the window
/// was created or last cleared, so callers can remember "everything up to
/// here has been looked at" without holding on to the samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Window<T> {
    items: VecDeque<T>,
    capacity: usize,
    pushed: u64,
}

impl<T> Window<T> {
    /// A window holding at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            pushed: 0,
        }
    }

    /// Append a sample, returning the evicted one if the window was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(value);
        self.pushed += 1;
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sequence number of the newest sample; zero when nothing was pushed.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.pushed = 0;
    }

    /// Sequence number of the sample at `index` (0 = oldest).
    fn seq_at(&self, index: usize) -> u64 {
        self.pushed - self.items.len() as u64 + index as u64 + 1
    }
}

impl<T: Clone> Window<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl Window<f64> {
    /// Newest minus oldest sample; zero with fewer than two samples.
    pub fn net_change(&self) -> f64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) if self.len() >= 2 => last - first,
            _ => 0.0,
        }
    }

    /// Frame-to-frame differences whose newer sample came after `seq`.
    pub fn deltas_since(&self, seq: u64) -> impl Iterator<Item = f64> + '_ {
        (1..self.items.len())
            .filter(move |&i| self.seq_at(i) > seq)
            .map(move |i| self.items[i] - self.items[i - 1])
    }

    /// The most recent `count` frame-to-frame differences after `seq`.
    pub fn recent_deltas_since(&self, count: usize, seq: u64) -> impl Iterator<Item = f64> + '_ {
        let start = self.items.len().saturating_sub(count).max(1);
        (start..self.items.len())
            .filter(move |&i| self.seq_at(i) > seq)
            .map(move |i| self.items[i] - self.items[i - 1])
    }
}
