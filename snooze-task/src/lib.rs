//! Provides the task abstraction used throughout snooze.
//!
//! A [`Task`] is a unit of deferred computation which makes progress each
//! time it is advanced. Unlike [`Future`]s, tasks are advanced through
//! `&mut self`: a task owns all of its state inline and never borrows from
//! its own fields, so it never needs to be pinned.
//!
//! [`snooze_task`] is orientated towards the use case of a single-threaded
//! event loop. Tasks cannot be moved or advanced from other threads, although
//! the wakers handed to them may be invoked from anywhere.
//!
//! # Components
//! - [`Task`] and [`Advance`]: the task contract.
//! - [`task_fn`] and [`ready`]: build tasks without declaring a type.
//! - [`TaskQueue`]: spawn and run local tasks, each with its own waker.
//! - [`JoinHandle`]: task resolving to the output of a spawned task.
//!
//! [`Future`]: std::future::Future
//! [`snooze_task`]: crate
#![deny(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::missing_safety_doc
)]
mod advance;
mod error;
mod join;
mod task;
mod taskqueue;
mod waker;

pub use advance::Advance;
pub use error::TaskError;
pub use join::JoinHandle;
pub use task::{ready, task_fn, LocalBoxTask, Ready, Task, TaskFn};
pub use taskqueue::TaskQueue;
pub use waker::TaskWaker;
