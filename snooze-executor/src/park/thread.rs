use std::io;
use std::thread::{self, Thread};

use super::{Park, ParkMode, Unpark};

const LOG: &str = "snooze_executor::park::thread";

/// A [`Park`] which blocks the current thread.
///
/// [`ParkMode::NextCompletion`] blocks until the thread is unparked,
/// [`ParkMode::Timeout`] blocks until it is unparked or the timeout elapses.
/// Unparking before the thread parks makes the next park return immediately,
/// so wakeups are never lost.
///
/// The [`ThreadPark`] must be used on the thread which created it.
#[derive(Debug)]
pub struct ThreadPark {
    unparker: ThreadUnparker,
}

/// [`Unpark`] handle for a [`ThreadPark`].
#[derive(Debug, Clone)]
pub struct ThreadUnparker {
    thread: Thread,
}

impl ThreadPark {
    /// Create a [`ThreadPark`] for the current thread.
    pub fn new() -> Self {
        Self {
            unparker: ThreadUnparker {
                thread: thread::current(),
            },
        }
    }
}

impl Default for ThreadPark {
    fn default() -> Self {
        Self::new()
    }
}

impl Unpark for ThreadUnparker {
    fn unpark(&self) {
        self.thread.unpark();
    }
}

impl Park for ThreadPark {
    type Unparker = ThreadUnparker;

    type Guard = ();

    fn park(&mut self, mode: ParkMode) -> Result<(), io::Error> {
        debug_assert_eq!(
            thread::current().id(),
            self.unparker.thread.id(),
            "ThreadPark used from a different thread"
        );
        match mode {
            ParkMode::NoPark => {}
            ParkMode::NextCompletion => {
                log::trace!(target: LOG, "park.block");
                thread::park();
            }
            ParkMode::Timeout(timeout) => {
                log::trace!(target: LOG, "park.timeout {:?}", timeout);
                thread::park_timeout(timeout);
            }
        }
        Ok(())
    }

    fn enter(&self) -> Self::Guard {}

    fn unparker(&self) -> Self::Unparker {
        self.unparker.clone()
    }

    fn shutdown(&mut self) {}
}
