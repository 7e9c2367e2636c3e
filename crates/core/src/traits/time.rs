//! Time abstraction for cooldown gating and loop pacing.
//!
//! The flight state machine never reads a clock itself: callers pass the
//! current timestamp in. `TimeSource` is what the control loop uses to
//! produce those timestamps, so tests can swap in [`MockTime`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic time source in microseconds since an arbitrary start.
///
/// # Example
///
/// ```
/// use gesture_pilot_core::traits::{MockTime, TimeSource};
///
/// fn due<T: TimeSource>(time: &T, last_us: u64, period_us: u64) -> bool {
///     time.elapsed_since(last_us) >= period_us
/// }
///
/// let time = MockTime::new();
/// time.advance(10_000);
/// assert!(due(&time, 0, 10_000));
/// ```
pub trait TimeSource: Clone + Send + Sync {
    /// Returns current time in microseconds.
    fn now_us(&self) -> u64;

    /// Returns current time in milliseconds.
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }

    /// Returns elapsed time in microseconds since a reference point.
    ///
    /// Uses saturating subtraction so a reference in the future yields zero.
    fn elapsed_since(&self, reference_us: u64) -> u64 {
        self.now_us().saturating_sub(reference_us)
    }
}

/// Wall-clock independent time source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// Mock time source with controllable advancement.
///
/// Clones share the same counter, so a test can hold one handle and advance
/// time while the code under test reads another.
#[derive(Debug, Clone, Default)]
pub struct MockTime {
    current_us: Arc<AtomicU64>,
}

impl MockTime {
    /// Creates a new `MockTime` starting at time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `MockTime` starting at the specified time.
    pub fn with_initial(us: u64) -> Self {
        Self {
            current_us: Arc::new(AtomicU64::new(us)),
        }
    }

    /// Sets the current time to an absolute value.
    pub fn set(&self, us: u64) {
        self.current_us.store(us, Ordering::Relaxed);
    }

    /// Advances the current time by the specified amount.
    pub fn advance(&self, us: u64) {
        self.current_us.fetch_add(us, Ordering::Relaxed);
    }
}

impl TimeSource for MockTime {
    fn now_us(&self) -> u64 {
        self.current_us.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_time_initial_value() {
        let time = MockTime::new();
        assert_eq!(time.now_us(), 0);
        assert_eq!(time.now_ms(), 0);
    }

    #[test]
    fn mock_time_advance_and_set() {
        let time = MockTime::with_initial(5_000_000);
        assert_eq!(time.now_ms(), 5000);

        time.advance(500_000);
        assert_eq!(time.now_us(), 5_500_000);

        time.set(1_999);
        assert_eq!(time.now_ms(), 1);
    }

    #[test]
    fn mock_time_shared_between_clones() {
        let a = MockTime::new();
        let b = a.clone();
        a.advance(1_000);
        assert_eq!(b.now_us(), 1_000);
    }

    #[test]
    fn mock_time_elapsed_since_saturates() {
        let time = MockTime::with_initial(1_000);
        assert_eq!(time.elapsed_since(300), 700);
        assert_eq!(time.elapsed_since(5_000), 0);
    }

    #[test]
    fn monotonic_clock_does_not_go_backwards() {
        let clock = MonotonicClock::new();
        let first = clock.now_us();
        let second = clock.now_us();
        assert!(second >= first);
    }
}
