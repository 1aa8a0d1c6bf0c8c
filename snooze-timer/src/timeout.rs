use std::task::Context;

use snooze_task::{Advance, Task};
use snooze_util::{Either, Select};

use crate::error::Elapsed;
use crate::Sleep;

/// Task returned by [`Handle::timeout`].
///
/// Completes with the output of the inner task, or with [`Elapsed`] if the
/// timer fires first. The inner task is advanced before the timer, so a task
/// which completes on the same advance the deadline passes still wins.
///
/// [`Handle::timeout`]: crate::Handle::timeout
#[derive(Debug)]
#[must_use = "tasks do nothing unless advanced"]
pub struct Timeout<T> {
    select: Select<T, Sleep>,
}

impl<T: Task> Timeout<T> {
    pub(crate) fn new(task: T, sleep: Sleep) -> Self {
        Self {
            select: snooze_util::select(task, sleep),
        }
    }

    /// Returns a reference to the inner task, if it has not completed.
    pub fn get_ref(&self) -> Option<&T> {
        self.select.get_ref().map(|(task, _)| task)
    }
}

impl<T: Task> Task for Timeout<T> {
    type Output = Result<T::Output, Elapsed>;

    fn advance(&mut self, cx: &mut Context<'_>) -> Advance<Self::Output> {
        self.select.advance(cx).map(|either| match either {
            Either::Left(output) => Ok(output),
            Either::Right(()) => Err(Elapsed(())),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_test::task::noop_context;
    use snooze_executor::park::SpinPark;
    use snooze_task::{ready, task_fn};

    use crate::{Clock, Driver};

    use super::*;

    #[test]
    fn inner_task_wins() {
        let driver = Driver::new(SpinPark, Clock::simulated());
        let mut timeout = driver.handle().timeout(Duration::from_secs(1), ready(7));
        assert_eq!(timeout.advance(&mut noop_context()), Advance::Completed(Ok(7)));
    }

    #[test]
    fn deadline_wins() {
        let clock = Clock::simulated();
        let driver = Driver::new(SpinPark, clock.clone());
        let mut timeout = driver
            .handle()
            .timeout(Duration::from_secs(1), task_fn(|_| Advance::<()>::Suspended));
        let mut cx = noop_context();
        assert!(timeout.advance(&mut cx).is_suspended());
        assert!(timeout.get_ref().is_some());

        clock.advance(Duration::from_secs(1));
        let Advance::Completed(Err(elapsed)) = timeout.advance(&mut cx) else {
            panic!("expected the deadline to elapse");
        };
        assert_eq!(elapsed.to_string(), "deadline has elapsed");
        assert!(timeout.get_ref().is_none());
    }
}
