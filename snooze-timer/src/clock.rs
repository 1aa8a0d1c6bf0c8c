use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A clock for tracking time.
///
/// Clones share the same time source, so advancing a simulated clock is
/// observed through every clone.
#[derive(Debug, Clone)]
pub struct Clock {
    start: Instant,
    time: TimeSource,
}

impl Clock {
    /// Create a new system clock.
    ///
    /// The system clock follows [`Instant::now`].
    pub fn system() -> Self {
        Self {
            start: Instant::now(),
            time: TimeSource::System,
        }
    }

    /// Create a new simulated clock.
    ///
    /// The simulated clock will start with frozen time.
    /// Time can be advanced by calling [`Clock::advance`].
    pub fn simulated() -> Self {
        Self {
            start: Instant::now(),
            time: TimeSource::Simulated {
                offset_nanos: Arc::new(AtomicU64::new(0)),
            },
        }
    }

    /// Returns `true` if this clock was created with [`Clock::simulated`].
    pub fn is_simulated(&self) -> bool {
        matches!(self.time, TimeSource::Simulated { .. })
    }

    /// Return the current instant.
    pub fn now(&self) -> Instant {
        match &self.time {
            TimeSource::System => Instant::now(),
            TimeSource::Simulated { offset_nanos } => {
                self.start + Duration::from_nanos(offset_nanos.load(Ordering::Acquire))
            }
        }
    }

    /// Return the time elapsed since this clock was created.
    pub fn elapsed(&self) -> Duration {
        self.now().saturating_duration_since(self.start)
    }

    /// Advance simulated time.
    ///
    /// ### Panics
    /// Panics if called on a system clock created with [`Clock::system`].
    pub fn advance(&self, duration: Duration) {
        match &self.time {
            TimeSource::System => panic!("Cannot advance system clock"),
            TimeSource::Simulated { offset_nanos } => {
                let nanos: u64 = duration
                    .as_nanos()
                    .try_into()
                    .expect("Duration too far into the future");
                offset_nanos.fetch_add(nanos, Ordering::AcqRel);
            }
        }
    }
}

#[derive(Debug, Clone)]
enum TimeSource {
    System,
    Simulated { offset_nanos: Arc<AtomicU64> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_time_is_frozen_until_advanced() {
        let clock = Clock::simulated();
        let start = clock.now();
        assert_eq!(clock.now(), start);

        let other = clock.clone();
        other.advance(Duration::from_millis(1500));
        assert_eq!(clock.now() - start, Duration::from_millis(1500));
        assert_eq!(clock.elapsed(), Duration::from_millis(1500));
    }

    #[test]
    #[should_panic(expected = "Cannot advance system clock")]
    fn system_clock_cannot_advance() {
        Clock::system().advance(Duration::from_secs(1));
    }
}
