//! A small cooperative task runtime.
//!
//! Tasks are values implementing [`Task`]. They are advanced by a single
//! driver thread, suspend explicitly, and register wakeups with the timer
//! registry. When nothing is ready the driver blocks until the earliest
//! deadline instead of spinning.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! let mut runtime = snooze::Runtime::new();
//! let timers: Vec<_> = (0..100)
//!     .map(|_| runtime.spawn_timer(Duration::from_secs(1)))
//!     .collect();
//! // Completes after roughly one second.
//! runtime.run(snooze::join_all(timers));
//! ```
//!
//! # Why there is no free `spawn_timer` or `run`
//!
//! A timer belongs to the registry of the [`Runtime`] that created it, and
//! only that runtime's driver fires it. Free functions would need a hidden
//! global runtime, so timers are created with [`Runtime::spawn_timer`] and
//! driven with [`Runtime::run`]. Inside a running task, [`sleep`] and
//! [`timeout`] reach the active runtime through its thread-local handle.
#![deny(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::missing_safety_doc
)]
use std::io;
use std::time::Duration;

pub use snooze_executor as executor;
pub use snooze_task::{completed, ready, task_fn, Advance, JoinHandle, Task, TaskError};
pub use snooze_timer as timer;
pub use snooze_timer::{sleep, timeout, Clock, Elapsed, Sleep, Timeout};
pub use snooze_util::{and_then, join_all, select, sequence, Either, JoinAll};

use snooze_executor::park::{Park, ThreadPark};
use snooze_executor::LocalExecutor;
use snooze_timer::Driver;

const LOG: &str = "snooze";

/// A timer driver stacked on a [`Park`] layer, driven by a
/// [`LocalExecutor`].
///
/// By default the driver thread blocks with [`ThreadPark`].
pub struct Runtime<P: Park = ThreadPark> {
    executor: LocalExecutor<Driver<P>>,
}

impl<P: Park> std::fmt::Debug for Runtime<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("executor", &self.executor)
            .field("timer", self.executor.park())
            .finish()
    }
}

impl Runtime {
    /// Create a runtime using the system clock.
    ///
    /// The runtime must be driven from the thread which created it.
    pub fn new() -> Self {
        Self::with_clock(Clock::system())
    }

    /// Create a runtime using the provided clock.
    pub fn with_clock(clock: Clock) -> Self {
        Self::with_park(ThreadPark::new(), clock)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Park> Runtime<P> {
    /// Create a runtime which blocks through `park` and reads time from
    /// `clock`.
    pub fn with_park(park: P, clock: Clock) -> Self {
        log::debug!(target: LOG, "runtime.new simulated={}", clock.is_simulated());
        Self {
            executor: LocalExecutor::new(Driver::new(park, clock)),
        }
    }

    /// Create a timer which fires once `duration` has elapsed.
    ///
    /// The deadline is computed now, not when the timer is first advanced.
    pub fn spawn_timer(&self, duration: Duration) -> Sleep {
        self.timer().sleep(duration)
    }

    /// Returns a handle to the timer driver.
    pub fn timer(&self) -> snooze_timer::Handle {
        self.executor.park().handle()
    }

    /// Returns a handle to the executor.
    pub fn handle(&self) -> snooze_executor::Handle {
        self.executor.handle()
    }

    /// Returns the clock used by the timer driver.
    pub fn clock(&self) -> &Clock {
        self.executor.park().clock()
    }

    /// Spawn a [`Task`] which runs alongside the root task.
    ///
    /// Spawned tasks only make progress while [`Runtime::run`] is driving
    /// the runtime, and are cancelled when the runtime is dropped.
    pub fn spawn<T>(&self, task: T) -> JoinHandle<T::Output>
    where
        T: Task + 'static,
        T::Output: 'static,
    {
        self.executor.handle().spawn(task)
    }

    /// Drive `root` to completion, returning its output.
    ///
    /// ### Panics
    /// Panics if the root task suspends while no timer is registered, since
    /// nothing could ever wake it up. Use [`Runtime::try_run`] to observe
    /// that as an error instead.
    pub fn run<T: Task>(&mut self, root: T) -> T::Output {
        self.executor.block_on(root)
    }

    /// Drive `root` to completion, returning an error if the driver fails.
    ///
    /// A root task which suspends with no scheduled wakeup results in a
    /// [`snooze_timer::Error`] which [`snooze_timer::Error::is_stalled`].
    pub fn try_run<T: Task>(&mut self, root: T) -> io::Result<T::Output> {
        self.executor.try_block_on(root)
    }
}
