use std::cell::{Cell, RefCell};
use std::mem;
use std::panic;
use std::rc::Rc;
use std::sync::Arc;
use std::task::Context;

use crate::join::JoinCell;
use crate::{Advance, JoinHandle, Task, TaskError, TaskWaker};

const LOG: &str = "snooze_task::taskqueue";

/// [`TaskQueue`] provides a way to spawn and run tasks.
///
/// Every spawned task gets its own [`TaskWaker`] and is only advanced by
/// [`TaskQueue::run`] after it was woken. Newly spawned tasks are advanced
/// once right away so they can register their wakeups.
///
/// ```rust
/// use snooze_task::{ready, Advance, Task, TaskQueue};
///
/// let tq = TaskQueue::new();
/// let mut handle = tq.spawn(ready(1 + 1));
///
/// let mut cx = futures_test::task::noop_context();
/// tq.run(&mut cx);
/// assert_eq!(handle.advance(&mut cx).completed().unwrap().unwrap(), 2);
/// ```
#[derive(Clone)]
pub struct TaskQueue {
    shared: Rc<Shared>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("len", &self.len())
            .field("shutdown", &self.shared.shutdown.get())
            .finish()
    }
}

struct Shared {
    /// Tasks which have been advanced at least once.
    tasks: RefCell<Vec<Entry>>,
    /// Tasks spawned since the last run.
    spawned: RefCell<Vec<Entry>>,
    shutdown: Cell<bool>,
}

struct Entry {
    task: Box<dyn Runnable>,
    waker: Option<Arc<TaskWaker>>,
}

impl TaskQueue {
    /// Construct a new [`TaskQueue`].
    pub fn new() -> Self {
        let shared = Shared {
            tasks: RefCell::new(Vec::new()),
            spawned: RefCell::new(Vec::new()),
            shutdown: Cell::new(false),
        };
        Self {
            shared: Rc::new(shared),
        }
    }

    /// Spawn a [`Task`] onto the [`TaskQueue`].
    ///
    /// Returns a [`JoinHandle`] which can be used to await the result of the
    /// task. If the queue has already been shut down, the returned
    /// [`JoinHandle`] resolves immediately with cancellation.
    pub fn spawn<T>(&self, task: T) -> JoinHandle<T::Output>
    where
        T: Task + 'static,
        T::Output: 'static,
    {
        if self.shared.shutdown.get() {
            return JoinHandle::new(JoinCell::cancelled());
        }
        let cell = JoinCell::new();
        let entry = Entry {
            task: Box::new(Spawned {
                task,
                cell: Rc::clone(&cell),
            }),
            waker: None,
        };
        self.shared.spawned.borrow_mut().push(entry);
        JoinHandle::new(cell)
    }

    /// Advance every task which was woken since the last run.
    ///
    /// Tasks spawned while running are advanced in the same call. Completed
    /// and aborted tasks are removed. Returns the number of advance calls.
    pub fn run(&self, cx: &mut Context<'_>) -> usize {
        let mut advanced = 0;
        let mut tasks = mem::take(&mut *self.shared.tasks.borrow_mut());
        advance_entries(&mut tasks, cx, &mut advanced);
        loop {
            let mut spawned = mem::take(&mut *self.shared.spawned.borrow_mut());
            if spawned.is_empty() {
                break;
            }
            advance_entries(&mut spawned, cx, &mut advanced);
            tasks.append(&mut spawned);
        }
        if self.shared.shutdown.get() {
            drop(tasks);
        } else {
            let mut current = self.shared.tasks.borrow_mut();
            debug_assert!(current.is_empty());
            *current = tasks;
        }
        advanced
    }

    /// Returns the number of tasks which have not completed yet.
    pub fn len(&self) -> usize {
        self.shared.tasks.borrow().len() + self.shared.spawned.borrow().len()
    }

    /// Returns `true` if there are no incomplete tasks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shutdown the [`TaskQueue`].
    ///
    /// Cancels all tasks and drops them. Tasks spawned afterwards are
    /// cancelled immediately.
    pub fn shutdown(&self) {
        self.shared.shutdown.set(true);
        let tasks = mem::take(&mut *self.shared.tasks.borrow_mut());
        let spawned = mem::take(&mut *self.shared.spawned.borrow_mut());
        log::debug!(target: LOG, "shutdown.cancel {}", tasks.len() + spawned.len());
        // Dropping a task may spawn or wake others, so no borrow is held here.
        drop(tasks);
        drop(spawned);
    }
}

/// Advance all woken entries, compacting out the ones which finished.
fn advance_entries(entries: &mut Vec<Entry>, cx: &mut Context<'_>, advanced: &mut usize) {
    entries.retain_mut(|entry| {
        if entry.task.is_aborted() {
            log::trace!(target: LOG, "run.aborted");
            return false;
        }
        let waker = entry
            .waker
            .get_or_insert_with(|| TaskWaker::new(cx.waker().clone()));
        if !waker.take_woken() {
            return true;
        }
        *advanced += 1;
        let waker = waker.waker();
        let mut cx = Context::from_waker(&waker);
        entry.task.run(&mut cx).is_suspended()
    });
}

/// Type-erased spawned task.
trait Runnable {
    fn run(&mut self, cx: &mut Context<'_>) -> Advance<()>;

    fn is_aborted(&self) -> bool;
}

struct Spawned<T: Task> {
    task: T,
    cell: Rc<JoinCell<T::Output>>,
}

impl<T: Task> Runnable for Spawned<T> {
    fn run(&mut self, cx: &mut Context<'_>) -> Advance<()> {
        let task = &mut self.task;
        match panic::catch_unwind(panic::AssertUnwindSafe(|| task.advance(cx))) {
            Ok(Advance::Completed(output)) => {
                self.cell.complete(Ok(output));
                Advance::Completed(())
            }
            Ok(Advance::Suspended) => Advance::Suspended,
            Err(payload) => {
                log::warn!(target: LOG, "run.panicked");
                self.cell.complete(Err(TaskError::panic(payload)));
                Advance::Completed(())
            }
        }
    }

    fn is_aborted(&self) -> bool {
        self.cell.is_aborted()
    }
}

impl<T: Task> Drop for Spawned<T> {
    fn drop(&mut self) {
        // No-op if the task already produced a result.
        self.cell.complete(Err(TaskError::cancelled()));
    }
}
