//! Bounded production history for charting.
//!
//! [`RingBuffer`] is a fixed-capacity FIFO: once full, each push overwrites
//! the oldest entry. [`HistoryBuffer`] specializes it to [`HistoryPoint`]s
//! with the simulator's 50-sample window.

use crate::model::ProductionStats;
use crate::sim::Ticks;

/// Number of samples retained by [`HistoryBuffer`].
pub const HISTORY_CAPACITY: usize = 50;

// ---------------------------------------------------------------------------
// RingBuffer
// ---------------------------------------------------------------------------

/// A fixed-capacity ring buffer. Iterates oldest-to-newest.
///
/// Storage grows up to `capacity`, then `head` marks the oldest slot and
/// advances on every overwrite.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    head: usize,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            data: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    /// Push a value, overwriting the oldest entry if at capacity.
    pub fn push(&mut self, value: T) {
        if self.data.len() < self.capacity {
            self.data.push(value);
        } else {
            self.data[self.head] = value;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Number of values currently stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the next push will evict the oldest entry.
    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    /// The most recently pushed value, if any.
    pub fn latest(&self) -> Option<&T> {
        if self.data.is_empty() {
            return None;
        }
        let idx = if self.head == 0 {
            self.data.len() - 1
        } else {
            self.head - 1
        };
        self.data.get(idx)
    }

    /// The oldest retained value, if any.
    pub fn oldest(&self) -> Option<&T> {
        self.data.get(self.head)
    }

    /// Iterate values from oldest to newest.
    pub fn iter(&self) -> RingBufferIter<'_, T> {
        RingBufferIter {
            buffer: self,
            front: 0,
            back: self.data.len(),
        }
    }

    fn physical(&self, logical: usize) -> usize {
        (self.head + logical) % self.data.len()
    }

    /// Drop all stored values without changing capacity.
    pub fn clear(&mut self) {
        self.data.clear();
        self.head = 0;
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Collect all stored values into a Vec (oldest to newest).
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

/// Iterator over [`RingBuffer`] values, oldest to newest.
pub struct RingBufferIter<'a, T> {
    buffer: &'a RingBuffer<T>,
    front: usize,
    back: usize,
}

impl<'a, T> Iterator for RingBufferIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let value = &self.buffer.data[self.buffer.physical(self.front)];
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for RingBufferIter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(&self.buffer.data[self.buffer.physical(self.back)])
    }
}

impl<T> ExactSizeIterator for RingBufferIter<'_, T> {}

// ---------------------------------------------------------------------------
// History points
// ---------------------------------------------------------------------------

/// One charted sample, recorded once per running tick.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoryPoint {
    /// Tick index at which the sample was taken (1-based).
    pub timestamp: Ticks,
    /// Glucose rate rounded to two decimals.
    pub glucose: f64,
    /// Oxygen rate rounded to two decimals.
    pub oxygen: f64,
}

impl HistoryPoint {
    /// Sample the given stats at `tick`, rounding rates for display.
    pub fn sample(tick: Ticks, stats: &ProductionStats) -> Self {
        Self {
            timestamp: tick,
            glucose: round2(stats.glucose_rate),
            oxygen: round2(stats.oxygen_rate),
        }
    }
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// HistoryBuffer
// ---------------------------------------------------------------------------

/// Sliding window of the most recent [`HISTORY_CAPACITY`] samples.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    points: RingBuffer<HistoryPoint>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self {
            points: RingBuffer::new(HISTORY_CAPACITY),
        }
    }

    /// Append at the tail, evicting the oldest point when full.
    pub fn append(&mut self, point: HistoryPoint) {
        self.points.push(point);
    }

    /// All retained points, oldest first.
    pub fn snapshot(&self) -> Vec<HistoryPoint> {
        self.points.to_vec()
    }

    pub fn iter(&self) -> RingBufferIter<'_, HistoryPoint> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.latest()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.points.capacity()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
