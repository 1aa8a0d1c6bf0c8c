use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Wake, Waker};

/// Wake handle for a single task.
///
/// A [`TaskWaker`] records that its task was woken and forwards the first
/// wakeup to a parent [`Waker`], typically the one owned by the driver. The
/// owner checks [`TaskWaker::take_woken`] to decide whether the task needs to
/// be advanced at all, so tasks which were not woken are skipped.
///
/// Invoking a [`TaskWaker`] after its task has been dropped only sets a flag
/// nobody reads and wakes the parent once.
#[derive(Debug)]
pub struct TaskWaker {
    woken: AtomicBool,
    parent: Waker,
}

impl TaskWaker {
    /// Create a new [`TaskWaker`] forwarding to `parent`.
    ///
    /// New wakers start out woken so the task is advanced at least once.
    pub fn new(parent: Waker) -> Arc<Self> {
        Arc::new(Self {
            woken: AtomicBool::new(true),
            parent,
        })
    }

    /// Returns a [`Waker`] for this task.
    pub fn waker(self: &Arc<Self>) -> Waker {
        Waker::from(Arc::clone(self))
    }

    /// Clears the woken flag, returning whether it was set.
    pub fn take_woken(&self) -> bool {
        self.woken.swap(false, Ordering::AcqRel)
    }

    /// Returns `true` if the task was woken since the last
    /// [`TaskWaker::take_woken`].
    pub fn is_woken(&self) -> bool {
        self.woken.load(Ordering::Acquire)
    }
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        if !self.woken.swap(true, Ordering::AcqRel) {
            self.parent.wake_by_ref();
        }
    }
}
