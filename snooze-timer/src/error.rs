use std::io;

/// Error returned from the timer driver.
#[derive(thiserror::Error, Debug, Clone, Copy)]
#[error(transparent)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub(super) fn stalled() -> Self {
        Self {
            kind: ErrorKind::Stalled,
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns `true` if a task suspended without scheduling a wakeup.
    pub fn is_stalled(&self) -> bool {
        self.kind == ErrorKind::Stalled
    }

    /// Returns the timer [`Error`] wrapped by an [`io::Error`], if any.
    ///
    /// Timer errors cross the [`Park`] boundary as [`io::Error`]s.
    ///
    /// [`Park`]: snooze_executor::park::Park
    pub fn from_io(err: &io::Error) -> Option<&Error> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<Error>())
    }
}

/// The kind of timer error.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The executor wanted to wait for the next completion, but no
    /// wakeup was scheduled, so it would have slept forever.
    #[error("task suspended with no scheduled wakeup")]
    Stalled,
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        io::Error::other(value)
    }
}

/// Error returned by [`Timeout`] when the deadline elapsed before the
/// task completed.
///
/// [`Timeout`]: crate::Timeout
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("deadline has elapsed")]
pub struct Elapsed(pub(crate) ());
