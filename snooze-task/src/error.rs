use std::any::Any;
use std::fmt;

/// [`TaskError`] indicates a failure in a spawned task.
///
/// Tasks can fail for one of two reasons. Either the task was cancelled, or
/// the task panicked. Users can check which of these two reasons caused the
/// failure via [`TaskError::is_cancelled`] and [`TaskError::is_panic`].
#[derive(thiserror::Error)]
#[error(transparent)]
pub struct TaskError {
    kind: Kind,
}

impl TaskError {
    /// Returns `true` if the task panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self.kind, Kind::Panic(_))
    }

    /// Returns `true` if the task was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, Kind::Cancelled)
    }

    /// Consumes the error, returning the panic payload if the task panicked.
    pub fn into_panic(self) -> Option<Box<dyn Any + Send + 'static>> {
        match self.kind {
            Kind::Panic(payload) => Some(payload.0),
            Kind::Cancelled => None,
        }
    }

    pub(crate) fn cancelled() -> Self {
        Self {
            kind: Kind::Cancelled,
        }
    }

    pub(crate) fn panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        Self {
            kind: Kind::Panic(Payload(payload)),
        }
    }
}

impl fmt::Debug for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Cancelled => write!(f, "TaskError::Cancelled"),
            Kind::Panic(_) => write!(f, "TaskError::Panic(...)"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum Kind {
    #[error("task was cancelled")]
    Cancelled,
    #[error("task panicked")]
    Panic(Payload),
}

struct Payload(Box<dyn Any + Send + 'static>);

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("...")
    }
}
