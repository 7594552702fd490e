//! Per-entity position history, used by the server to rewind a kicker or
//! the ball to a recent sample for lag-compensated kick validation.

use std::collections::VecDeque;

/// One recorded sample: position plus the client-relative timestamp it was
/// recorded at (milliseconds, monotonic within a session).
#[derive(Debug, Clone, Copy)]
pub struct HistorySample {
    pub x: f64,
    pub y: f64,
    pub timestamp_ms: u64,
}

/// Ring buffer retaining roughly the last second of samples (60 at a 16 ms
/// tick). Bounded by capacity rather than wall-clock age, since the
/// scheduler pushes exactly one sample per physics tick.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<HistorySample>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::with_capacity(60)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { samples: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, x: f64, y: f64, timestamp_ms: u64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(HistorySample { x, y, timestamp_ms });
    }

    /// Finds the sample closest to `timestamp_ms`, or `None` if the buffer
    /// is empty. Callers are responsible for rejecting samples outside the
    /// allowed rewind window (§4.F: 500 ms).
    pub fn closest(&self, timestamp_ms: u64) -> Option<HistorySample> {
        self.samples
            .iter()
            .min_by_key(|s| (s.timestamp_ms as i64 - timestamp_ms as i64).unsigned_abs())
            .copied()
    }

    pub fn latest(&self) -> Option<HistorySample> {
        self.samples.back().copied()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_returns_nearest_by_timestamp() {
        let mut hist = HistoryBuffer::new();
        hist.push(0.0, 0.0, 0);
        hist.push(10.0, 0.0, 100);
        hist.push(20.0, 0.0, 200);
        let sample = hist.closest(120).unwrap();
        assert_eq!(sample.timestamp_ms, 100);
    }

    #[test]
    fn drops_oldest_beyond_capacity() {
        let mut hist = HistoryBuffer::with_capacity(2);
        hist.push(0.0, 0.0, 0);
        hist.push(1.0, 0.0, 1);
        hist.push(2.0, 0.0, 2);
        assert_eq!(hist.closest(0).unwrap().timestamp_ms, 1);
    }
}
