//! Adaptive commit batch sizing.

use std::time::Duration;

/// Bounds and latency target for adaptive batching.
#[derive(Debug, Clone, Copy)]
pub struct BatchTuning {
    /// Smallest allowed batch.
    pub min: usize,
    /// Largest allowed batch.
    pub max: usize,
    /// Commit latency the sizer steers toward.
    pub target_latency: Duration,
}

impl Default for BatchTuning {
    fn default() -> Self {
        Self {
            min: 100,
            max: 10_000,
            target_latency: Duration::from_millis(100),
        }
    }
}

/// Keeps store commits inside a bounded latency window.
///
/// After every commit the observed duration nudges the next batch
/// size toward the target latency, proportionally and damped, clamped
/// to the configured bounds. Record size variance is thereby absorbed
/// into batch size instead of commit latency.
#[derive(Debug)]
pub struct BatchSizer {
    tuning: BatchTuning,
    current: usize,
}

/// A single adjustment never more than halves or doubles the batch.
const MAX_STEP: f64 = 2.0;
const MIN_STEP: f64 = 0.5;

impl BatchSizer {
    /// Creates a sizer starting at the minimum batch size.
    #[must_use]
    pub fn new(tuning: BatchTuning) -> Self {
        Self {
            current: tuning.min,
            tuning,
        }
    }

    /// Returns the batch size to use for the next commit.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Feeds back an observed commit duration.
    pub fn record_commit(&mut self, observed: Duration) {
        let observed = observed.max(Duration::from_micros(1));
        let ratio = self.tuning.target_latency.as_secs_f64() / observed.as_secs_f64();
        let ratio = ratio.clamp(MIN_STEP, MAX_STEP);
        let next = (self.current as f64 * ratio).round() as usize;
        self.current = next.clamp(self.tuning.min, self.tuning.max);
    }
}
