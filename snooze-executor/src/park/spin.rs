use std::io;

use super::{Park, ParkMode, Unpark};

/// A [`Park`] which never blocks.
///
/// Every [`Park::park`] call returns immediately, turning the executor
/// into a busy loop. Tasks must still register their wakeups: a task which
/// was not woken is never advanced again, no matter how often the
/// executor spins.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinPark;

impl Unpark for SpinPark {
    fn unpark(&self) {}
}

impl Park for SpinPark {
    type Unparker = SpinPark;

    type Guard = ();

    fn park(&mut self, _mode: ParkMode) -> Result<(), io::Error> {
        std::hint::spin_loop();
        Ok(())
    }

    fn enter(&self) -> Self::Guard {}

    fn unparker(&self) -> Self::Unparker {
        SpinPark
    }

    fn shutdown(&mut self) {}
}
