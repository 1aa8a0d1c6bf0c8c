//! Provides a single-threaded executor for driving [`Task`]s
//! to completion.
//!
//! The executor advances the root task only after it was woken. When
//! nothing was woken it hands control to its [`park::Park`] layer, which
//! blocks the thread until the next wakeup instead of spinning.
//!
//! # Modules
//! - [`park`]: parking and unparking abstractions plus built-in implementations.
#![deny(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::missing_safety_doc
)]
use std::io;
use std::sync::Arc;
use std::task::Waker;

use snooze_task::{JoinHandle, Task};

mod context;
mod harness;
/// Parking abstractions and built-in park implementations.
pub mod park;

const LOG: &str = "snooze_executor";

/// A single-threaded executor for driving [`Task`]s to completion.
///
/// [`LocalExecutor`] can be driven by calling [`LocalExecutor::block_on`].
pub struct LocalExecutor<P: park::Park> {
    /// Spawned tasks, advanced whenever they are woken.
    taskqueue: snooze_task::TaskQueue,
    park: P,
}

impl<P: park::Park> std::fmt::Debug for LocalExecutor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalExecutor")
            .field("taskqueue", &self.taskqueue)
            .finish()
    }
}

impl<P: park::Park> LocalExecutor<P> {
    /// Construct a new [`LocalExecutor`] with the given [`park::Park`].
    ///
    /// The [`LocalExecutor`] will use the given [`park::Park`] to block the
    /// driver thread when there are no tasks ready to be advanced.
    pub fn new(park: P) -> Self {
        Self {
            taskqueue: snooze_task::TaskQueue::new(),
            park,
        }
    }

    /// Returns a [`Handle`] to the [`LocalExecutor`].
    ///
    /// The [`Handle`] can be used to spawn new tasks onto the [`LocalExecutor`].
    pub fn handle(&self) -> Handle {
        Handle {
            taskqueue: self.taskqueue.clone(),
        }
    }

    /// Returns a reference to the [`park::Park`] layer.
    pub fn park(&self) -> &P {
        &self.park
    }

    /// Blocks the current thread until the provided [`Task`] has completed.
    ///
    /// This will run all tasks which have been spawned onto the [`LocalExecutor`]
    /// and drive the [`park::Park`] instance.
    ///
    /// ### Panics
    /// Panics if [`park::Park::park`] returns an error, for example when the
    /// root task suspended without any scheduled wakeup.
    pub fn block_on<T>(&mut self, task: T) -> T::Output
    where
        T: Task,
    {
        match self.try_block_on(task) {
            Ok(output) => output,
            Err(err) => panic!("executor failed: {err}"),
        }
    }

    /// Blocks the current thread until the provided [`Task`] has completed,
    /// returning an error if the [`park::Park`] layer fails.
    ///
    /// The root task is dropped (cancelled) when an error is returned.
    pub fn try_block_on<T>(&mut self, task: T) -> io::Result<T::Output>
    where
        T: Task,
    {
        let _g = self.enter();
        let notify = harness::Notify::new(self.park.unparker());
        let waker = Waker::from(Arc::clone(&notify));
        let mut cx = std::task::Context::from_waker(&waker);
        let mut root = harness::RootHarness::new(task, waker.clone());

        loop {
            if let Some(output) = root.try_advance() {
                return Ok(output);
            }
            let advanced = self.taskqueue.run(&mut cx);
            let mut mode = park::ParkMode::NextCompletion;
            if notify.take() || root.is_woken() {
                mode = park::ParkMode::NoPark;
            }
            log::trace!(target: LOG, "block_on.park {:?} advanced={}", mode, advanced);
            self.park.park(mode)?;
        }
    }

    fn enter(&self) -> (P::Guard, context::ContextGuard) {
        let g1 = self.park.enter();
        let g2 = context::Context::enter(self.handle());
        (g1, g2)
    }
}

/// A handle to a [`LocalExecutor`].
#[derive(Debug, Clone)]
pub struct Handle {
    taskqueue: snooze_task::TaskQueue,
}

impl Handle {
    /// Returns a [`Handle`] to the current [`LocalExecutor`].
    ///
    /// ### Panics
    /// This function will panic if called from outside of a [`LocalExecutor`]
    /// context.
    pub fn current() -> Self {
        context::Context::handle().expect("executor not set")
    }

    /// Returns a [`Handle`] to the current [`LocalExecutor`], if any.
    pub fn try_current() -> Option<Self> {
        context::Context::handle()
    }

    /// Spawn a [`Task`] onto the [`LocalExecutor`].
    ///
    /// The spawned task will run on the thread driving the [`LocalExecutor`].
    /// It is advanced once right away and then only when woken.
    pub fn spawn<T>(&self, task: T) -> JoinHandle<T::Output>
    where
        T: Task + 'static,
        T::Output: 'static,
    {
        self.taskqueue.spawn(task)
    }
}

/// Spawn a [`Task`] onto the current [`LocalExecutor`].
///
/// The spawned task will run on the thread driving the [`LocalExecutor`].
///
/// ### Panics
/// Panics if called from outside of a [`LocalExecutor`] context.
pub fn spawn<T>(task: T) -> JoinHandle<T::Output>
where
    T: Task + 'static,
    T::Output: 'static,
{
    Handle::current().spawn(task)
}

impl<P: park::Park> Drop for LocalExecutor<P> {
    fn drop(&mut self) {
        let _g = self.enter();
        self.taskqueue.shutdown();
        self.park.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use snooze_task::{ready, task_fn, Advance};

    use crate::park::SpinPark;

    use super::*;

    fn init_logging() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Trace)
            .is_test(true)
            .try_init();
    }

    #[test]
    fn block_on() {
        let mut executor = LocalExecutor::new(SpinPark);

        let res = executor.block_on(ready(1 + 1));
        assert_eq!(res, 2);
    }

    #[test]
    fn spawn_in_block_on() {
        let mut executor = LocalExecutor::new(SpinPark);

        let handle = executor.handle();
        let task = snooze_util::and_then(ready(()), move |()| handle.spawn(ready(1 + 1)));
        let res = executor.block_on(task);
        assert_eq!(res.unwrap(), 2);
    }

    #[test]
    fn spawn_before_block_on() {
        let mut executor = LocalExecutor::new(SpinPark);
        let handle = executor.handle();

        let f1 = handle.spawn(ready(1 + 1));
        let res = executor.block_on(f1).unwrap();
        assert_eq!(res, 2);
    }

    #[test]
    fn spawn_after_shutdown() {
        let executor = LocalExecutor::new(SpinPark);
        let handle = executor.handle();

        drop(executor);
        let mut f1 = handle.spawn(ready(1 + 1));

        let mut cx = futures_test::task::noop_context();
        let Advance::Completed(res) = f1.advance(&mut cx) else {
            panic!("expected completion");
        };
        assert!(res.is_err());
        assert!(res.err().unwrap().is_cancelled());
    }

    #[test]
    fn spawn_from_context() {
        let mut executor = LocalExecutor::new(SpinPark);

        let task = snooze_util::and_then(ready(()), |()| crate::spawn(ready(1 + 1)));
        let res = executor.block_on(task);
        assert_eq!(res.unwrap(), 2);
    }

    #[test]
    fn root_is_only_advanced_after_wakeups() {
        init_logging();
        let mut executor = LocalExecutor::new(SpinPark);
        let root_waker: Rc<RefCell<Option<Waker>>> = Rc::default();

        let stored = Rc::clone(&root_waker);
        let mut yields = 0;
        executor
            .handle()
            .spawn(task_fn(move |cx| {
                if yields < 100 {
                    yields += 1;
                    cx.waker().wake_by_ref();
                    return Advance::Suspended;
                }
                match stored.borrow_mut().take() {
                    Some(waker) => {
                        waker.wake();
                        Advance::Completed(())
                    }
                    None => {
                        cx.waker().wake_by_ref();
                        Advance::Suspended
                    }
                }
            }))
            .detach();

        let polls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&polls);
        let mut woken = false;
        executor.block_on(task_fn(move |cx| {
            counter.set(counter.get() + 1);
            if woken {
                return Advance::Completed(());
            }
            woken = true;
            *root_waker.borrow_mut() = Some(cx.waker().clone());
            Advance::Suspended
        }));
        assert_eq!(polls.get(), 2);
    }

    #[test]
    fn block_on_panics_on_park_error() {
        #[derive(Clone, Copy, Debug)]
        struct TestUnparker;

        impl park::Unpark for TestUnparker {
            fn unpark(&self) {}
        }

        #[derive(Debug)]
        struct FailingPark;

        impl park::Park for FailingPark {
            type Unparker = TestUnparker;
            type Guard = ();

            fn park(&mut self, _: park::ParkMode) -> io::Result<()> {
                Err(io::Error::other("park failed"))
            }

            fn enter(&self) -> Self::Guard {}

            fn unparker(&self) -> Self::Unparker {
                TestUnparker
            }

            fn shutdown(&mut self) {}
        }

        let mut executor = LocalExecutor::new(FailingPark);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            executor.block_on(task_fn(|_| Advance::<()>::Suspended))
        }));
        assert!(result.is_err(), "block_on should panic on park error");

        let err = executor
            .try_block_on(task_fn(|_| Advance::<()>::Suspended))
            .unwrap_err();
        assert_eq!(err.to_string(), "park failed");
    }
}
