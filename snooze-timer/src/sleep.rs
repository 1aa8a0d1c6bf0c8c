use std::task::Context;
use std::time::{Duration, Instant};

use snooze_task::{Advance, Task};

use crate::Handle;

const LOG: &str = "snooze_timer::sleep";

/// Deadline used for durations which overflow [`Instant`], roughly 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn deadline_after(now: Instant, duration: Duration) -> Instant {
    now.checked_add(duration).unwrap_or(now + FAR_FUTURE)
}

/// Task returned by [`Handle::sleep`].
///
/// The deadline is fixed when the [`Sleep`] is created. Every advance which
/// finds the deadline in the future registers the caller's waker under that
/// deadline and suspends. The task completes once the deadline has passed,
/// or the timer driver is shutdown.
#[must_use = "tasks do nothing unless advanced"]
pub struct Sleep {
    handle: Handle,
    deadline: Instant,
    duration: Duration,
    completed: bool,
}

impl std::fmt::Debug for Sleep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sleep")
            .field("deadline", &self.deadline)
            .field("duration", &self.duration)
            .field("completed", &self.completed)
            .finish()
    }
}

impl Sleep {
    pub(crate) fn new(handle: Handle, duration: Duration) -> Self {
        let deadline = deadline_after(handle.clock().now(), duration);
        Self::until(handle, deadline, duration)
    }

    pub(crate) fn until(handle: Handle, deadline: Instant, duration: Duration) -> Self {
        Self {
            handle,
            deadline,
            duration,
            completed: false,
        }
    }

    /// Returns the instant at which the timer fires.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns `true` if the deadline has passed.
    pub fn is_elapsed(&self) -> bool {
        self.handle.clock().now() >= self.deadline
    }

    /// Reset the timer.
    ///
    /// The deadline moves to the original duration from now, and a
    /// completed timer can be advanced again.
    ///
    /// This can be used to implement retry logic without
    /// having to create a new timer.
    pub fn reset(&mut self) {
        self.deadline = deadline_after(self.handle.clock().now(), self.duration);
        self.completed = false;
    }
}

impl Task for Sleep {
    type Output = ();

    fn advance(&mut self, cx: &mut Context<'_>) -> Advance<Self::Output> {
        assert!(!self.completed, "Sleep advanced after completion");
        if self.is_elapsed() {
            self.completed = true;
            return Advance::Completed(());
        }
        if !self.handle.registry.insert(self.deadline, cx.waker()) {
            log::debug!(target: LOG, "sleep.shutdown {:?}", self.deadline);
            self.completed = true;
            return Advance::Completed(());
        }
        Advance::Suspended
    }
}

#[cfg(test)]
mod tests {
    use futures_test::task::{new_count_waker, noop_context};

    use crate::{Clock, Driver};
    use snooze_executor::park::SpinPark;

    use super::*;

    #[test]
    fn registers_on_every_suspension() {
        let clock = Clock::simulated();
        let driver = Driver::new(SpinPark, clock.clone());
        let handle = driver.handle();

        let mut sleep = handle.sleep(Duration::from_secs(1));
        assert_eq!(sleep.deadline(), clock.now() + Duration::from_secs(1));

        let (waker, count) = new_count_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(sleep.advance(&mut cx).is_suspended());
        assert!(sleep.advance(&mut cx).is_suspended());
        assert_eq!(handle.registered(), 1, "same waker deduplicated");

        let (other, _) = new_count_waker();
        assert!(sleep.advance(&mut Context::from_waker(&other)).is_suspended());
        assert_eq!(handle.registered(), 2);

        clock.advance(Duration::from_secs(1));
        assert!(sleep.is_elapsed());
        assert_eq!(sleep.advance(&mut cx), Advance::Completed(()));
        assert_eq!(count.get(), 0, "only the driver fires registered wakers");
    }

    #[test]
    fn huge_duration_is_clamped() {
        let clock = Clock::simulated();
        let driver = Driver::new(SpinPark, clock.clone());
        let mut sleep = driver.handle().sleep(Duration::MAX);
        assert_eq!(sleep.deadline(), clock.now() + FAR_FUTURE);
        assert!(sleep.advance(&mut noop_context()).is_suspended());
        assert_eq!(driver.handle().registered(), 1);

        sleep.reset();
        assert!(sleep.advance(&mut noop_context()).is_suspended());
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let driver = Driver::new(SpinPark, Clock::simulated());
        let mut sleep = driver.handle().sleep(Duration::ZERO);
        assert!(sleep.advance(&mut noop_context()).is_completed());
        assert_eq!(driver.handle().registered(), 0);
    }

    #[test]
    #[should_panic(expected = "Sleep advanced after completion")]
    fn advance_after_completion_panics() {
        let driver = Driver::new(SpinPark, Clock::simulated());
        let mut sleep = driver.handle().sleep(Duration::ZERO);
        let mut cx = noop_context();
        let _ = sleep.advance(&mut cx);
        let _ = sleep.advance(&mut cx);
    }

    #[test]
    fn reset_rearms_for_original_duration() {
        let clock = Clock::simulated();
        let driver = Driver::new(SpinPark, clock.clone());
        let mut sleep = driver.handle().sleep(Duration::from_millis(100));
        let mut cx = noop_context();

        clock.advance(Duration::from_millis(100));
        assert!(sleep.advance(&mut cx).is_completed());

        clock.advance(Duration::from_millis(50));
        sleep.reset();
        assert_eq!(sleep.deadline(), clock.now() + Duration::from_millis(100));
        assert!(sleep.advance(&mut cx).is_suspended());
        clock.advance(Duration::from_millis(100));
        assert!(sleep.advance(&mut cx).is_completed());
    }

    #[test]
    fn completes_after_driver_shutdown() {
        let driver = Driver::new(SpinPark, Clock::simulated());
        let handle = driver.handle();
        let mut sleep = handle.sleep(Duration::from_secs(60));
        let (waker, count) = new_count_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(sleep.advance(&mut cx).is_suspended());

        drop(driver);
        assert_eq!(count.get(), 1, "shutdown wakes pending sleepers");
        assert!(sleep.advance(&mut cx).is_completed());
    }
}
