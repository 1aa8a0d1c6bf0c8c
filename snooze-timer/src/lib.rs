//! Timers for snooze.
//!
//! Timers register their wakers in a time-ordered registry owned by the
//! [`Driver`]. The [`Driver`] is a [`Park`] layer: whenever the executor runs
//! out of work it fires every due timer and otherwise blocks the inner
//! [`Park`] until the earliest deadline.
//!
//! A [`Driver`] asked to wait for the next completion while no timer is
//! registered fails with [`ErrorKind::Stalled`], since nothing would ever
//! wake it up again.
#![deny(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::missing_safety_doc
)]
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use clock::Clock;
pub use error::{Elapsed, Error, ErrorKind};
pub use sleep::Sleep;
pub use timeout::Timeout;

use snooze_executor::park::{Park, ParkMode};
use snooze_task::Task;

mod clock;
mod context;
mod error;
mod registry;
mod sleep;
mod timeout;

const LOG: &str = "snooze_timer";

/// [`Driver`] for time based operations.
///
/// This supports driving multiple timers simultaneously.
pub struct Driver<P> {
    registry: Arc<registry::Registry>,
    inner: P,
    clock: Clock,
}

impl<P> std::fmt::Debug for Driver<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("clock", &self.clock)
            .field("registered", &self.registry.len())
            .field("shutdown", &self.registry.is_shutdown())
            .finish()
    }
}

/// Handle to the timer driver.
///
/// This can be used to create new timers. Handles may be sent to other
/// threads; a timer registered from another thread which becomes the
/// earliest deadline unparks the driver.
#[derive(Clone)]
pub struct Handle {
    registry: Arc<registry::Registry>,
    clock: Clock,
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("clock", &self.clock)
            .finish()
    }
}

impl Handle {
    /// Create a new timer with the specified duration.
    ///
    /// The deadline is computed now. Once it has passed, the timer will fire.
    pub fn sleep(&self, duration: Duration) -> Sleep {
        Sleep::new(self.clone(), duration)
    }

    /// Create a new timer which fires at `deadline`.
    pub fn sleep_until(&self, deadline: Instant) -> Sleep {
        let duration = deadline.saturating_duration_since(self.clock.now());
        Sleep::until(self.clone(), deadline, duration)
    }

    /// Require `task` to complete within `duration`.
    pub fn timeout<T: Task>(&self, duration: Duration, task: T) -> Timeout<T> {
        Timeout::new(task, self.sleep(duration))
    }

    /// Get the clock used by the timer.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Number of wakers currently waiting on a deadline.
    pub fn registered(&self) -> usize {
        self.registry.len()
    }

    /// Returns the earliest deadline a waker is waiting on.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.registry.next_deadline()
    }

    /// Get a handle to the current timer.
    ///
    /// ### Panics
    /// This will panic if called from outside of a timer context.
    pub fn current() -> Self {
        context::Context::handle().expect("timer not started")
    }

    /// Get a handle to the current timer, if any.
    pub fn try_current() -> Option<Self> {
        context::Context::handle()
    }
}

/// Create a timer on the current timer driver.
///
/// ### Panics
/// Panics if called from outside of a timer context.
pub fn sleep(duration: Duration) -> Sleep {
    Handle::current().sleep(duration)
}

/// Require `task` to complete within `duration`, using the current timer
/// driver.
///
/// ### Panics
/// Panics if called from outside of a timer context.
pub fn timeout<T: Task>(duration: Duration, task: T) -> Timeout<T> {
    Handle::current().timeout(duration, task)
}

impl<P: Park> Driver<P> {
    /// Create a new timer driver with the provided clock.
    ///
    /// The clock will be used to determine the current time. The inner
    /// [`Park`] is used to block until the next deadline.
    pub fn new(inner: P, clock: Clock) -> Self {
        let registry = Arc::new(registry::Registry::new());
        registry.set_unparker(inner.unparker());
        Self {
            registry,
            inner,
            clock,
        }
    }
}

impl<P> Driver<P> {
    /// Get a handle to the timer driver.
    pub fn handle(&self) -> Handle {
        Handle {
            clock: self.clock.clone(),
            registry: self.registry.clone(),
        }
    }

    /// Get the clock used by the timer.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Returns a reference to the inner [`Park`] layer.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn fire_due(&self) -> usize {
        let fired = self.registry.fire_due(self.clock.now());
        if fired > 0 {
            log::trace!(target: LOG, "driver.fired {}", fired);
        }
        fired
    }
}

impl<P> Drop for Driver<P> {
    fn drop(&mut self) {
        // Always wake outstanding sleepers even if callers drop the timer
        // driver directly without going through Park::shutdown.
        self.registry.shutdown();
    }
}

impl<P> Park for Driver<P>
where
    P: Park,
{
    type Unparker = P::Unparker;

    type Guard = (context::ContextGuard, P::Guard);

    fn park(&mut self, mode: ParkMode) -> Result<(), io::Error> {
        if self.fire_due() > 0 || mode == ParkMode::NoPark {
            return self.inner.park(ParkMode::NoPark);
        }

        let next = self.registry.prepare_park();
        let mode = match (next, mode) {
            (None, ParkMode::NextCompletion) => {
                self.registry.finish_park();
                log::debug!(target: LOG, "driver.stalled");
                return Err(Error::stalled().into());
            }
            (None, mode) => mode,
            (Some(deadline), mode) => {
                let until = deadline.saturating_duration_since(self.clock.now());
                match mode {
                    ParkMode::Timeout(timeout) => ParkMode::Timeout(timeout.min(until)),
                    _ => ParkMode::Timeout(until),
                }
            }
        };
        log::trace!(target: LOG, "driver.park {:?}", mode);
        let result = self.inner.park(mode);
        self.registry.finish_park();
        result?;

        self.fire_due();
        Ok(())
    }

    fn enter(&self) -> Self::Guard {
        let handle = self.handle();
        let guard = context::Context::enter(handle);
        (guard, self.inner.enter())
    }

    fn unparker(&self) -> Self::Unparker {
        self.inner.unparker()
    }

    fn shutdown(&mut self) {
        let woken = self.registry.shutdown();
        log::debug!(target: LOG, "driver.shutdown woken={}", woken);
        self.inner.shutdown()
    }
}
