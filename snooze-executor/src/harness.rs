//! Wake plumbing between the driver loop and the root task.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Wake, Waker};

use snooze_task::{Task, TaskWaker};

use crate::park::Unpark;

/// The driver-owned wake handle.
///
/// Waking it records that some task needs to be advanced and unparks the
/// driver thread, which may be blocked in [`Park::park`].
///
/// [`Park::park`]: crate::park::Park::park
pub(crate) struct Notify<U> {
    notified: AtomicBool,
    unparker: U,
}

impl<U> Notify<U>
where
    U: Unpark + Send + Sync + 'static,
{
    pub(crate) fn new(unparker: U) -> Arc<Self> {
        Arc::new(Self {
            notified: AtomicBool::new(false),
            unparker,
        })
    }

    /// Clears the notification, returning whether one was pending.
    pub(crate) fn take(&self) -> bool {
        self.notified.swap(false, Ordering::AcqRel)
    }
}

impl<U> Wake for Notify<U>
where
    U: Unpark + Send + Sync + 'static,
{
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.notified.store(true, Ordering::Release);
        self.unparker.unpark();
    }
}

/// Owns the root task and its [`TaskWaker`].
pub(crate) struct RootHarness<T> {
    task: T,
    waker: Arc<TaskWaker>,
}

impl<T: Task> RootHarness<T> {
    pub(crate) fn new(task: T, parent: Waker) -> Self {
        Self {
            task,
            waker: TaskWaker::new(parent),
        }
    }

    /// Advance the root task if it was woken since the last attempt.
    pub(crate) fn try_advance(&mut self) -> Option<T::Output> {
        if !self.waker.take_woken() {
            return None;
        }
        let waker = self.waker.waker();
        let mut cx = Context::from_waker(&waker);
        self.task.advance(&mut cx).completed()
    }

    pub(crate) fn is_woken(&self) -> bool {
        self.waker.is_woken()
    }
}
