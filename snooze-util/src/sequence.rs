//! Hand-written state machines for sequential composition.
//!
//! Each suspension point of the represented logic becomes a variant of a
//! state enum. Locals which live across a suspension point are stored inline
//! in the variant, so a task never holds a borrow into itself.
use std::fmt;
use std::mem;
use std::task::Context;

use snooze_task::{Advance, Task};

/// Creates a [`Sequence`]: run `start`, wait for `child`, then run `finish`
/// with the child's output.
///
/// `start` runs during the first advance, exactly once, no matter how often
/// the sequence is advanced while it waits for `child`.
///
/// ```rust
/// use snooze_task::{ready, Advance, Task};
///
/// let mut task = snooze_util::sequence(
///     || println!("start"),
///     ready(20),
///     |value| value + 1,
/// );
/// let mut cx = futures_test::task::noop_context();
/// assert_eq!(task.advance(&mut cx), Advance::Completed(21));
/// ```
pub fn sequence<S, T, F, O>(start: S, child: T, finish: F) -> Sequence<S, T, F>
where
    S: FnOnce(),
    T: Task,
    F: FnOnce(T::Output) -> O,
{
    Sequence {
        child,
        state: SequenceState::NotStarted { start, finish },
    }
}

/// Task returned by [`sequence`].
#[must_use = "tasks do nothing unless advanced"]
pub struct Sequence<S, T, F> {
    child: T,
    state: SequenceState<S, F>,
}

enum SequenceState<S, F> {
    NotStarted { start: S, finish: F },
    AwaitingChild { finish: F },
    Done,
}

impl<S, F> SequenceState<S, F> {
    fn name(&self) -> &'static str {
        match self {
            SequenceState::NotStarted { .. } => "NotStarted",
            SequenceState::AwaitingChild { .. } => "AwaitingChild",
            SequenceState::Done => "Done",
        }
    }
}

impl<S, T, F> fmt::Debug for Sequence<S, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("state", &self.state.name())
            .finish()
    }
}

impl<S, T, F, O> Task for Sequence<S, T, F>
where
    S: FnOnce(),
    T: Task,
    F: FnOnce(T::Output) -> O,
{
    type Output = O;

    fn advance(&mut self, cx: &mut Context<'_>) -> Advance<O> {
        loop {
            match mem::replace(&mut self.state, SequenceState::Done) {
                SequenceState::NotStarted { start, finish } => {
                    start();
                    self.state = SequenceState::AwaitingChild { finish };
                }
                SequenceState::AwaitingChild { finish } => match self.child.advance(cx) {
                    Advance::Suspended => {
                        self.state = SequenceState::AwaitingChild { finish };
                        return Advance::Suspended;
                    }
                    Advance::Completed(output) => return Advance::Completed(finish(output)),
                },
                SequenceState::Done => panic!("Sequence advanced after completion"),
            }
        }
    }
}

/// Creates an [`AndThen`]: wait for `first`, build the next task from its
/// output with `f`, then wait for that task.
///
/// Nesting [`and_then`] builds state machines with any number of suspension
/// points, and `f` may choose between different continuations.
pub fn and_then<A, B, F>(first: A, f: F) -> AndThen<A, B, F>
where
    A: Task,
    B: Task,
    F: FnOnce(A::Output) -> B,
{
    AndThen {
        state: AndThenState::First { task: first, f },
    }
}

/// Task returned by [`and_then`].
#[must_use = "tasks do nothing unless advanced"]
pub struct AndThen<A, B, F> {
    state: AndThenState<A, B, F>,
}

enum AndThenState<A, B, F> {
    First { task: A, f: F },
    Second(B),
    Done,
}

impl<A, B, F> fmt::Debug for AndThen<A, B, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            AndThenState::First { .. } => "First",
            AndThenState::Second(_) => "Second",
            AndThenState::Done => "Done",
        };
        f.debug_struct("AndThen").field("state", &state).finish()
    }
}

impl<A, B, F> Task for AndThen<A, B, F>
where
    A: Task,
    B: Task,
    F: FnOnce(A::Output) -> B,
{
    type Output = B::Output;

    fn advance(&mut self, cx: &mut Context<'_>) -> Advance<B::Output> {
        loop {
            match &mut self.state {
                AndThenState::First { task, .. } => {
                    let output = snooze_task::completed!(task.advance(cx));
                    let AndThenState::First { f, .. } =
                        mem::replace(&mut self.state, AndThenState::Done)
                    else {
                        unreachable!();
                    };
                    self.state = AndThenState::Second(f(output));
                }
                AndThenState::Second(task) => {
                    let output = snooze_task::completed!(task.advance(cx));
                    self.state = AndThenState::Done;
                    return Advance::Completed(output);
                }
                AndThenState::Done => panic!("AndThen advanced after completion"),
            }
        }
    }
}
