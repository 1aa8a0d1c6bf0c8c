use std::fmt;
use std::task::Context;

use crate::Advance;

/// A unit of deferred, resumable computation.
///
/// Each call to [`Task::advance`] makes as much progress as possible without
/// blocking and then reports either [`Advance::Completed`] or
/// [`Advance::Suspended`]. A task which suspends must have arranged for the
/// waker in `cx` (or one derived from it) to be invoked once it can make
/// progress again.
///
/// ## Contract
/// - `advance` must return promptly. Blocking inside `advance` stalls every
///   other task on the driver.
/// - Once a task has completed it must not be advanced again. Implementations
///   in this workspace panic when that happens.
/// - Dropping a task cancels it. Wakers it handed out may still be invoked
///   afterwards, which must be harmless.
pub trait Task {
    /// The value produced once the task completes.
    type Output;

    /// Attempt to make progress on the task.
    fn advance(&mut self, cx: &mut Context<'_>) -> Advance<Self::Output>;
}

impl<T> Task for Box<T>
where
    T: Task + ?Sized,
{
    type Output = T::Output;

    fn advance(&mut self, cx: &mut Context<'_>) -> Advance<Self::Output> {
        (**self).advance(cx)
    }
}

impl<T> Task for &mut T
where
    T: Task + ?Sized,
{
    type Output = T::Output;

    fn advance(&mut self, cx: &mut Context<'_>) -> Advance<Self::Output> {
        (**self).advance(cx)
    }
}

/// A boxed, type-erased [`Task`] which is not required to be [`Send`].
pub type LocalBoxTask<'a, T> = Box<dyn Task<Output = T> + 'a>;

/// Creates a [`Task`] which advances by calling the provided closure.
///
/// ```rust
/// use snooze_task::{task_fn, Advance, Task};
///
/// let mut remaining = 2;
/// let mut task = task_fn(move |cx| {
///     if remaining == 0 {
///         return Advance::Completed("done");
///     }
///     remaining -= 1;
///     cx.waker().wake_by_ref();
///     Advance::Suspended
/// });
///
/// let mut cx = futures_test::task::noop_context();
/// assert!(task.advance(&mut cx).is_suspended());
/// assert!(task.advance(&mut cx).is_suspended());
/// assert_eq!(task.advance(&mut cx), Advance::Completed("done"));
/// ```
pub fn task_fn<T, F>(f: F) -> TaskFn<F>
where
    F: FnMut(&mut Context<'_>) -> Advance<T>,
{
    TaskFn { f, done: false }
}

/// Task returned by [`task_fn`].
#[must_use = "tasks do nothing unless advanced"]
pub struct TaskFn<F> {
    f: F,
    done: bool,
}

impl<F> fmt::Debug for TaskFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn").field("done", &self.done).finish()
    }
}

impl<T, F> Task for TaskFn<F>
where
    F: FnMut(&mut Context<'_>) -> Advance<T>,
{
    type Output = T;

    fn advance(&mut self, cx: &mut Context<'_>) -> Advance<T> {
        assert!(!self.done, "TaskFn advanced after completion");
        let advance = (self.f)(cx);
        self.done = advance.is_completed();
        advance
    }
}

/// Creates a [`Task`] which completes with `value` on its first advance.
pub fn ready<T>(value: T) -> Ready<T> {
    Ready(Some(value))
}

/// Task returned by [`ready`].
#[derive(Debug)]
#[must_use = "tasks do nothing unless advanced"]
pub struct Ready<T>(Option<T>);

impl<T> Task for Ready<T> {
    type Output = T;

    fn advance(&mut self, _cx: &mut Context<'_>) -> Advance<T> {
        let value = self.0.take().expect("Ready advanced after completion");
        Advance::Completed(value)
    }
}
