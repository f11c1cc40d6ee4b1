//! Ingestion rate throttle.

use std::thread;
use std::time::{Duration, Instant};

/// Per-unit delay in microseconds applied for each point of load factor.
const BASE_DELAY_MICROS: u64 = 10;

/// Minimum deficit worth sleeping for; below this the throttle keeps
/// accumulating instead of issuing sub-millisecond sleeps.
const MIN_SLEEP: Duration = Duration::from_millis(2);

/// Paces a hot loop so average throughput is inversely proportional
/// to a configured load factor.
///
/// The throttle is amortised: it tracks the target elapsed time for
/// the number of units processed and sleeps only the deficit. Calling
/// [`Throttle::sleep`] once per line costs a clock read when the loop
/// is on or behind schedule, so it is safe at line frequency.
///
/// A factor of 0 disables throttling entirely.
#[derive(Debug)]
pub struct Throttle {
    load_factor: u32,
    started: Instant,
    units: u64,
}

impl Throttle {
    /// Creates a throttle for the given load factor.
    #[must_use]
    pub fn new(load_factor: u32) -> Self {
        Self {
            load_factor,
            started: Instant::now(),
            units: 0,
        }
    }

    /// Restarts the pacing window.
    pub fn reset(&mut self) {
        self.started = Instant::now();
        self.units = 0;
    }

    /// Records one processed unit and sleeps if ahead of schedule.
    pub fn sleep(&mut self) {
        if self.load_factor == 0 {
            return;
        }

        self.units += 1;
        let micros = BASE_DELAY_MICROS
            .saturating_mul(u64::from(self.load_factor))
            .saturating_mul(self.units);
        let target = Duration::from_micros(micros);
        let elapsed = self.started.elapsed();
        if target > elapsed {
            let deficit = target - elapsed;
            if deficit >= MIN_SLEEP {
                thread::sleep(deficit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_zero_never_sleeps() {
        let mut throttle = Throttle::new(0);
        let start = Instant::now();
        for _ in 0..100_000 {
            throttle.sleep();
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn pacing_slows_throughput() {
        // Factor 100 => 1ms per unit => 50 units take at least ~50ms.
        let mut throttle = Throttle::new(100);
        let start = Instant::now();
        for _ in 0..50 {
            throttle.sleep();
        }
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn reset_clears_the_window() {
        let mut throttle = Throttle::new(100);
        for _ in 0..10 {
            throttle.sleep();
        }
        throttle.reset();

        // After reset the first unit owes only one base delay, well
        // below the minimum sleep, so this returns immediately.
        let start = Instant::now();
        throttle.sleep();
        assert!(start.elapsed() < Duration::from_millis(5));
    }
}
