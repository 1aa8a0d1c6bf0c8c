//! Blocking layers stacked under the [`LocalExecutor`].
//!
//! Once the executor has advanced everything that was woken, it calls
//! [`Park::park`]. The timer driver is such a layer: it fires due timers and
//! decides how long the thread may block, then hands the remaining wait to
//! the layer below it, usually a [`ThreadPark`].
//!
//! [`LocalExecutor`]: crate::LocalExecutor
use std::io;
use std::sync::Arc;
use std::time::Duration;

mod spin;
mod thread;

pub use spin::SpinPark;
pub use thread::{ThreadPark, ThreadUnparker};

/// How long a [`Park::park`] call may block.
///
/// Returning sooner than requested is always allowed; the executor simply
/// loops and parks again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkMode {
    /// Something was woken already, return without blocking.
    NoPark,

    /// Nothing was woken. Block until a wakeup is due, for example the
    /// earliest timer deadline. A layer that knows no wakeup can ever come
    /// fails instead of blocking forever.
    NextCompletion,

    /// Block for at most the given duration.
    Timeout(Duration),
}

/// A layer the executor hands the thread to when it has nothing to advance.
///
/// Layers nest: each one does its own work (such as firing timers) and then
/// parks the layer it wraps with a possibly shorter [`ParkMode`]. The
/// bottom layer actually blocks.
///
/// [`Park::unparker`] gives out a handle that other threads use to cut a
/// blocking park short.
pub trait Park {
    /// Handle which interrupts a blocked [`Park::park`].
    type Unparker: Unpark + Clone + Send + Sync + 'static;

    /// Returned by [`Park::enter`] and dropped when the executor stops
    /// driving, which is where thread-local handles get cleared.
    type Guard;

    /// Give the thread to this layer until `mode` says to return.
    ///
    /// An error ends [`LocalExecutor::try_block_on`] with that error, for
    /// example when a task suspended without any scheduled wakeup.
    ///
    /// [`LocalExecutor::try_block_on`]: crate::LocalExecutor::try_block_on
    fn park(&mut self, mode: ParkMode) -> Result<(), io::Error>;

    /// Install this layer's thread-local state before any task is advanced.
    fn enter(&self) -> Self::Guard;

    /// Returns a handle that wakes this layer from any thread.
    fn unparker(&self) -> Self::Unparker;

    /// Tear the layer down.
    ///
    /// Runs when the executor is dropped, after spawned tasks were cancelled.
    /// Pending timers are woken so nothing waits on a dead layer.
    fn shutdown(&mut self);
}

/// Wakes a thread blocked in [`Park::park`].
pub trait Unpark {
    /// Make the blocked (or next) [`Park::park`] call return.
    fn unpark(&self);
}

impl<T> Unpark for &T
where
    T: Unpark,
{
    fn unpark(&self) {
        (**self).unpark()
    }
}

impl<T> Unpark for Arc<T>
where
    T: Unpark + ?Sized,
{
    fn unpark(&self) {
        (**self).unpark()
    }
}

impl<T> Unpark for Box<T>
where
    T: Unpark + ?Sized,
{
    fn unpark(&self) {
        (**self).unpark()
    }
}
