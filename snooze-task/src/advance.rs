use std::task::Poll;

/// The result of advancing a [`Task`].
///
/// Returning [`Advance::Suspended`] obligates the task to make sure some
/// waker reachable from the advance call will eventually be invoked.
/// Otherwise the task is never advanced again.
///
/// [`Task`]: crate::Task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "a suspended task must be advanced again once woken"]
pub enum Advance<T> {
    /// The task finished with the given output.
    Completed(T),
    /// The task can not make progress until it is woken.
    Suspended,
}

impl<T> Advance<T> {
    /// Returns `true` if the task completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, Advance::Completed(_))
    }

    /// Returns `true` if the task suspended.
    pub fn is_suspended(&self) -> bool {
        matches!(self, Advance::Suspended)
    }

    /// Maps the output of a completed task.
    pub fn map<U, F>(self, f: F) -> Advance<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Advance::Completed(t) => Advance::Completed(f(t)),
            Advance::Suspended => Advance::Suspended,
        }
    }

    /// Returns the output of a completed task, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Advance::Completed(t) => Some(t),
            Advance::Suspended => None,
        }
    }
}

impl<T> From<Poll<T>> for Advance<T> {
    fn from(poll: Poll<T>) -> Self {
        match poll {
            Poll::Ready(t) => Advance::Completed(t),
            Poll::Pending => Advance::Suspended,
        }
    }
}

impl<T> From<Advance<T>> for Poll<T> {
    fn from(advance: Advance<T>) -> Self {
        match advance {
            Advance::Completed(t) => Poll::Ready(t),
            Advance::Suspended => Poll::Pending,
        }
    }
}

/// Extracts the output of a completed [`Advance`], returning
/// [`Advance::Suspended`] from the enclosing function otherwise.
///
/// This is the [`Advance`] counterpart of [`std::task::ready!`].
///
/// ```rust
/// use std::task::Context;
/// use snooze_task::{completed, Advance, Task};
///
/// fn double<T: Task<Output = u32>>(task: &mut T, cx: &mut Context<'_>) -> Advance<u32> {
///     let value = completed!(task.advance(cx));
///     Advance::Completed(value * 2)
/// }
/// ```
#[macro_export]
macro_rules! completed {
    ($e:expr $(,)?) => {
        match $e {
            $crate::Advance::Completed(t) => t,
            $crate::Advance::Suspended => return $crate::Advance::Suspended,
        }
    };
}
