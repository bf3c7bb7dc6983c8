//! High-resolution monotonic clock used to bracket timed phases.
//!
//! A [`Clock`] is calibrated once at startup and passed by reference into the
//! runner. There is no process-wide timer state.

use crate::error::{BenchError, Result};
use quanta::Mock;
use std::sync::Arc;
use std::time::Duration;

/// How long calibration waits for the counter to advance before giving up.
const CALIBRATION_WINDOW: Duration = Duration::from_millis(2);

/// Upper bound on calibration wall time.
const CALIBRATION_DEADLINE: Duration = Duration::from_secs(1);

/// Opaque timestamp produced by [`Clock::now`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(u64);

/// Calibrated monotonic clock.
#[derive(Debug, Clone)]
pub struct Clock {
    inner: quanta::Clock,
    ticks_per_second: f64,
}

impl Clock {
    /// Calibrate the platform counter.
    ///
    /// Waits for the counter to advance over a short window. Fails with [`BenchError::ClockUnavailable`] if the counter does
    /// not advance, in which case no measurement can be trusted.
    pub fn calibrate() -> Result<Self> {
        let inner = quanta::Clock::new();
        let deadline = std::time::Instant::now() + CALIBRATION_DEADLINE;

        let start = inner.raw();
        let mut end = start;
        let window_nanos = CALIBRATION_WINDOW.as_nanos() as u64;
        while inner.delta_as_nanos(start, end) < window_nanos {
            if std::time::Instant::now() > deadline {
                return Err(BenchError::ClockUnavailable(format!(
                    "counter did not advance {CALIBRATION_WINDOW:?} within {CALIBRATION_DEADLINE:?}"
                )));
            }
            std::hint::spin_loop();
            end = inner.raw();
        }

        let nanos = inner.delta_as_nanos(start, end) as f64;
        let ticks = end.wrapping_sub(start) as f64;
        let ticks_per_second = ticks / nanos * 1e9;
        if !ticks_per_second.is_finite() || ticks_per_second <= 0.0 {
            return Err(BenchError::ClockUnavailable(format!(
                "implausible tick rate {ticks_per_second}"
            )));
        }

        tracing::debug!("Clock calibrated at {:.0} ticks/s", ticks_per_second);
        Ok(Self {
            inner,
            ticks_per_second,
        })
    }

    /// Clock driven by a manually advanced mock, for tests that inject
    /// elapsed time.
    pub fn mock() -> (Self, Arc<Mock>) {
        let (inner, mock) = quanta::Clock::mock();
        (
            Self {
                inner,
                ticks_per_second: 1e9,
            },
            mock,
        )
    }

    /// Current timestamp.
    pub fn now(&self) -> Timestamp {
        Timestamp(self.inner.raw())
    }

    /// Seconds between two timestamps. Zero if `end` is not after `start`.
    ///
    /// Ticks are scaled by quanta's own calibrated conversion.
    pub fn elapsed_seconds(&self, start: Timestamp, end: Timestamp) -> f64 {
        self.delta_nanos(start, end) as f64 / 1e9
    }

    /// Elapsed time between two timestamps as a `Duration`.
    pub fn elapsed(&self, start: Timestamp, end: Timestamp) -> Duration {
        Duration::from_nanos(self.delta_nanos(start, end))
    }

    // quanta subtracts with wrapping; clamp so reversed pairs read as zero.
    fn delta_nanos(&self, start: Timestamp, end: Timestamp) -> u64 {
        if end <= start {
            0
        } else {
            self.inner.delta_as_nanos(start.0, end.0)
        }
    }

    /// Counter frequency observed during calibration. Diagnostic only; it
    /// does not take part in [`Clock::elapsed_seconds`].
    pub fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibrate_succeeds() {
        let clock = Clock::calibrate().unwrap();
        assert!(clock.ticks_per_second() > 0.0);
    }

    #[test]
    fn test_ticks_per_second_agrees_with_elapsed() {
        let clock = Clock::calibrate().unwrap();
        let start = clock.now();
        std::thread::sleep(Duration::from_millis(20));
        let end = clock.now();

        let elapsed = clock.elapsed_seconds(start, end);
        let from_ticks = end.0.wrapping_sub(start.0) as f64 / clock.ticks_per_second();
        assert!(elapsed > 0.0);
        assert!((from_ticks - elapsed).abs() / elapsed < 0.05, "{from_ticks} vs {elapsed}");
    }

    #[test]
    fn test_elapsed_same_timestamp_is_zero() {
        let clock = Clock::calibrate().unwrap();
        let t = clock.now();
        assert!(clock.elapsed_seconds(t, t).abs() < f64::EPSILON);
    }

    #[test]
    fn test_elapsed_non_decreasing() {
        let (clock, mock) = Clock::mock();
        let start = clock.now();
        let mut previous = 0.0;
        for step in [0u64, 10, 1_000, 1_000_000, 0, 5] {
            mock.increment(step);
            let elapsed = clock.elapsed_seconds(start, clock.now());
            assert!(elapsed >= previous);
            previous = elapsed;
        }
        assert!((previous - 0.001_001_015).abs() < 1e-12);
    }

    #[test]
    fn test_reversed_timestamps_clamp_to_zero() {
        let (clock, mock) = Clock::mock();
        let early = clock.now();
        mock.increment(Duration::from_millis(3));
        let late = clock.now();
        assert!(clock.elapsed_seconds(late, early).abs() < f64::EPSILON);
        assert_eq!(clock.elapsed(early, late), Duration::from_millis(3));
    }
}
