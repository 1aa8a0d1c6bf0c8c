//! Race two tasks against each other.
use std::task::Context;

use snooze_task::{Advance, Task};

/// Output of [`Select`]: which of the two tasks finished first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Either<A, B> {
    /// The first task completed.
    Left(A),
    /// The second task completed.
    Right(B),
}

/// Creates a [`Select`] which completes with whichever of `a` and `b`
/// completes first.
///
/// `a` is advanced before `b` on every advance, so if both are able to
/// complete during the same advance `a` wins. The losing task is dropped
/// without being advanced again, which cancels it.
pub fn select<A, B>(a: A, b: B) -> Select<A, B>
where
    A: Task,
    B: Task,
{
    Select {
        inner: Some((a, b)),
    }
}

/// Task returned by [`select`].
#[derive(Debug)]
#[must_use = "tasks do nothing unless advanced"]
pub struct Select<A, B> {
    inner: Option<(A, B)>,
}

impl<A, B> Select<A, B> {
    /// Returns references to both tasks, if neither has completed yet.
    pub fn get_ref(&self) -> Option<(&A, &B)> {
        self.inner.as_ref().map(|(a, b)| (a, b))
    }
}

impl<A, B> Task for Select<A, B>
where
    A: Task,
    B: Task,
{
    type Output = Either<A::Output, B::Output>;

    fn advance(&mut self, cx: &mut Context<'_>) -> Advance<Self::Output> {
        let (a, b) = self
            .inner
            .as_mut()
            .expect("Select advanced after completion");
        let output = if let Advance::Completed(output) = a.advance(cx) {
            Either::Left(output)
        } else if let Advance::Completed(output) = b.advance(cx) {
            Either::Right(output)
        } else {
            return Advance::Suspended;
        };
        // Drop both tasks now, cancelling the loser.
        self.inner = None;
        Advance::Completed(output)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use snooze_task::{ready, task_fn};

    use super::*;

    struct DropFlag(Rc<Cell<bool>>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    fn never(flag: Rc<Cell<bool>>) -> impl Task<Output = ()> {
        let guard = DropFlag(flag);
        task_fn(move |_| {
            let _guard = &guard;
            Advance::Suspended
        })
    }

    #[test]
    fn first_task_wins_ties() {
        let mut cx = futures_test::task::noop_context();
        let mut raced = select(ready(1), ready("b"));
        assert_eq!(raced.advance(&mut cx), Advance::Completed(Either::Left(1)));
    }

    #[test]
    fn loser_is_dropped() {
        let mut cx = futures_test::task::noop_context();
        let dropped = Rc::new(Cell::new(false));
        let mut raced = select(never(Rc::clone(&dropped)), ready(2));
        assert!(raced.get_ref().is_some());
        assert_eq!(raced.advance(&mut cx), Advance::Completed(Either::Right(2)));
        assert!(dropped.get());
        assert!(raced.get_ref().is_none());
    }

    #[test]
    fn suspends_until_either_completes() {
        let mut cx = futures_test::task::noop_context();
        let dropped = Rc::new(Cell::new(false));
        let mut raced = select(never(Rc::clone(&dropped)), never(Rc::clone(&dropped)));
        assert!(raced.advance(&mut cx).is_suspended());
        assert!(!dropped.get());
    }

    #[test]
    #[should_panic(expected = "Select advanced after completion")]
    fn advancing_after_completion_panics() {
        let mut cx = futures_test::task::noop_context();
        let mut raced = select(ready(()), ready(()));
        let _ = raced.advance(&mut cx);
        let _ = raced.advance(&mut cx);
    }
}
