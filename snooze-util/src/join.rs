//! A task which completes once all of its children have completed.
use std::fmt;
use std::task::Context;

use snooze_task::{Advance, Task};

/// Creates a [`JoinAll`] from the provided tasks.
///
/// The children are advanced in the order they are yielded by `tasks`, and the
/// outputs are returned in the same order.
///
/// ```rust
/// use snooze_task::{ready, Advance, Task};
///
/// let mut joined = snooze_util::join_all([ready(1), ready(2), ready(3)]);
/// let mut cx = futures_test::task::noop_context();
/// assert_eq!(joined.advance(&mut cx), Advance::Completed(vec![1, 2, 3]));
/// ```
pub fn join_all<I>(tasks: I) -> JoinAll<I::Item>
where
    I: IntoIterator,
    I::Item: Task,
{
    let pending: Vec<_> = tasks.into_iter().enumerate().collect();
    let outputs = pending.iter().map(|_| None).collect();
    JoinAll {
        pending,
        outputs,
        done: false,
    }
}

/// Task returned by [`join_all`].
#[must_use = "tasks do nothing unless advanced"]
pub struct JoinAll<T: Task> {
    /// Children which have not completed yet, tagged with their position.
    pending: Vec<(usize, T)>,
    outputs: Vec<Option<T::Output>>,
    done: bool,
}

impl<T: Task> JoinAll<T> {
    /// Returns the number of children which have not completed yet.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if every child has completed.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T: Task> fmt::Debug for JoinAll<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinAll")
            .field("pending", &self.pending.len())
            .field("total", &self.outputs.len())
            .finish()
    }
}

impl<T: Task> Task for JoinAll<T> {
    type Output = Vec<T::Output>;

    fn advance(&mut self, cx: &mut Context<'_>) -> Advance<Self::Output> {
        assert!(!self.done, "JoinAll advanced after completion");
        let outputs = &mut self.outputs;
        // Single compaction pass: completed children are dropped in place.
        self.pending.retain_mut(|(index, task)| match task.advance(cx) {
            Advance::Completed(output) => {
                outputs[*index] = Some(output);
                false
            }
            Advance::Suspended => true,
        });
        if !self.pending.is_empty() {
            return Advance::Suspended;
        }
        self.done = true;
        let outputs = std::mem::take(&mut self.outputs)
            .into_iter()
            .map(|output| output.expect("every joined task completed"))
            .collect();
        Advance::Completed(outputs)
    }
}
