use std::cell::RefCell;

use crate::Handle;

thread_local! {
    static CURRENT: RefCell<Option<Handle>> = const { RefCell::new(None) };
}

pub(crate) struct Context;

impl Context {
    pub(crate) fn enter(handle: Handle) -> ContextGuard {
        CURRENT.with(|current| {
            let mut current = current.borrow_mut();
            assert!(current.is_none(), "executor already set");
            *current = Some(handle);
        });
        ContextGuard {}
    }

    /// Returns a handle to the current executor.
    pub(crate) fn handle() -> Option<Handle> {
        CURRENT.with(|current| current.borrow().clone())
    }
}

#[derive(Debug)]
pub(crate) struct ContextGuard;

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT.with(|current| {
            let handle = current.borrow_mut().take();
            assert!(handle.is_some(), "executor not set");
        });
    }
}
