use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::Rc;
use std::task::{Context, Waker};

use crate::{Advance, Task, TaskError};

/// A handle to a spawned task.
///
/// [`JoinHandle`] is itself a [`Task`] which completes with the output of the
/// spawned task. If the [`JoinHandle`] is dropped while the task is running,
/// it will continue running in the background.
#[must_use = "tasks do nothing unless advanced"]
pub struct JoinHandle<T> {
    cell: Rc<JoinCell<T>>,
}

impl<T> std::fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(cell: Rc<JoinCell<T>>) -> Self {
        Self { cell }
    }

    /// Abort the task associated with this [`JoinHandle`].
    ///
    /// If the task already completed, its result will be returned. Otherwise
    /// the [`JoinHandle`] resolves to a cancellation error right away and is
    /// woken, and the task is dropped without being advanced again the next
    /// time its queue runs.
    pub fn abort(&self) {
        self.cell.aborted.set(true);
        self.cell.complete(Err(TaskError::cancelled()));
    }

    /// Returns `true` once the task has produced its result.
    pub fn is_finished(&self) -> bool {
        !matches!(&*self.cell.state.borrow(), JoinState::Running(_))
    }

    /// Detach the task from this [`JoinHandle`].
    ///
    /// This is a convenience method that will drop the [`JoinHandle`] without
    /// cancelling the task. This signals intent to the reader that the task
    /// result is not needed.
    pub fn detach(self) {}
}

impl<T> Task for JoinHandle<T> {
    type Output = Result<T, TaskError>;

    fn advance(&mut self, cx: &mut Context<'_>) -> Advance<Self::Output> {
        let mut state = self.cell.state.borrow_mut();
        match mem::replace(&mut *state, JoinState::Taken) {
            JoinState::Finished(result) => Advance::Completed(result),
            JoinState::Running(_) => {
                // Only the most recent waker is needed.
                *state = JoinState::Running(Some(cx.waker().clone()));
                Advance::Suspended
            }
            JoinState::Taken => panic!("JoinHandle advanced after completion"),
        }
    }
}

/// State shared by a spawned task and its [`JoinHandle`].
pub(crate) struct JoinCell<T> {
    state: RefCell<JoinState<T>>,
    aborted: Cell<bool>,
}

enum JoinState<T> {
    Running(Option<Waker>),
    Finished(Result<T, TaskError>),
    Taken,
}

impl<T> JoinCell<T> {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(JoinState::Running(None)),
            aborted: Cell::new(false),
        })
    }

    pub(crate) fn cancelled() -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(JoinState::Finished(Err(TaskError::cancelled()))),
            aborted: Cell::new(false),
        })
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.aborted.get()
    }

    /// Store the result of the task, waking the [`JoinHandle`].
    ///
    /// Results after the first are ignored.
    pub(crate) fn complete(&self, result: Result<T, TaskError>) {
        let waker = {
            let mut state = self.state.borrow_mut();
            let JoinState::Running(waker) = &mut *state else {
                return;
            };
            let waker = waker.take();
            *state = JoinState::Finished(result);
            waker
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}
