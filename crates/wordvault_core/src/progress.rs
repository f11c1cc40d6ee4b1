//! Population progress tracking.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Shared progress state for a population run.
///
/// All counters are atomic and readable while ingestion is in flight;
/// the facade reads them to render the OPENING progress line without
/// touching the engine.
#[derive(Debug)]
pub struct PopulationProgress {
    /// Total source lines, from the pre-scan. 0 while unknown.
    total_lines: AtomicU64,
    /// Source lines consumed so far (including skipped ones).
    seen_lines: AtomicU64,
    /// Lines that produced stored records.
    added: AtomicU64,
    /// Lines filtered out (blank, comment).
    ignored: AtomicU64,
    /// Whether a population run is currently active.
    running: AtomicBool,
    /// Start of the current run.
    started: RwLock<Instant>,
}

impl Default for PopulationProgress {
    fn default() -> Self {
        Self {
            total_lines: AtomicU64::new(0),
            seen_lines: AtomicU64::new(0),
            added: AtomicU64::new(0),
            ignored: AtomicU64::new(0),
            running: AtomicBool::new(false),
            started: RwLock::new(Instant::now()),
        }
    }
}

impl PopulationProgress {
    /// Creates a fresh progress tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a run as started, seeding the line counters.
    pub(crate) fn start_run(&self, resumed_from: u64) {
        self.seen_lines.store(resumed_from, Ordering::Relaxed);
        self.added.store(0, Ordering::Relaxed);
        self.ignored.store(0, Ordering::Relaxed);
        *self.started.write() = Instant::now();
        self.running.store(true, Ordering::Release);
    }

    /// Marks the run as finished.
    pub(crate) fn finish_run(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub(crate) fn set_total_lines(&self, total: u64) {
        self.total_lines.store(total, Ordering::Relaxed);
    }

    pub(crate) fn record_line(&self, stored: bool) {
        self.seen_lines.fetch_add(1, Ordering::Relaxed);
        if stored {
            self.added.fetch_add(1, Ordering::Relaxed);
        } else {
            self.ignored.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Whether a population run is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Lines that produced stored records in the current run.
    #[must_use]
    pub fn added(&self) -> u64 {
        self.added.load(Ordering::Relaxed)
    }

    /// Lines filtered out in the current run.
    #[must_use]
    pub fn ignored(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }

    /// Elapsed time of the current run.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.read().elapsed()
    }

    /// Percentage of the source consumed, when the total is known.
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        let total = self.total_lines.load(Ordering::Relaxed);
        if total == 0 {
            return None;
        }
        let seen = self.seen_lines.load(Ordering::Relaxed).min(total);
        Some(seen as f64 * 100.0 / total as f64)
    }

    /// Lines per second over the current run.
    #[must_use]
    pub fn rate(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        let done = self.added.load(Ordering::Relaxed) + self.ignored.load(Ordering::Relaxed);
        done as f64 / elapsed
    }

    /// Estimated time remaining, when total and rate are known.
    #[must_use]
    pub fn eta(&self) -> Option<Duration> {
        let total = self.total_lines.load(Ordering::Relaxed);
        let seen = self.seen_lines.load(Ordering::Relaxed);
        let rate = self.rate();
        if total == 0 || rate <= 0.0 || seen >= total {
            return None;
        }
        Some(Duration::from_secs_f64((total - seen) as f64 / rate))
    }

    /// Human-readable progress summary.
    ///
    /// Example: `42.1% complete, 1534 lines/s, ~3m12s remaining`.
    #[must_use]
    pub fn summary(&self) -> String {
        let rate = self.rate();
        match (self.percent(), self.eta()) {
            (Some(percent), Some(eta)) => format!(
                "{percent:.1}% complete, {rate:.0} lines/s, ~{} remaining",
                format_duration(eta)
            ),
            (Some(percent), None) => {
                format!("{percent:.1}% complete, {rate:.0} lines/s")
            }
            _ => format!("{} lines processed, {rate:.0} lines/s", {
                self.added.load(Ordering::Relaxed) + self.ignored.load(Ordering::Relaxed)
            }),
        }
    }
}

/// Compact `1h2m`, `3m12s`, `45s` rendering.
fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 3600 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}
