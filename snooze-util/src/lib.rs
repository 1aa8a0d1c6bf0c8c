//! Utilities for composing snooze tasks.
//!
//! # Combinators
//! - [`join_all`]: complete once every child task has completed.
//! - [`sequence`]: run a step, wait for a child task, then run another step.
//! - [`and_then`]: chain a task built from the output of another one.
//! - [`select`]: race two tasks, dropping the loser.
#![deny(missing_docs, rust_2018_idioms, clippy::missing_safety_doc)]

mod join;
mod select;
mod sequence;

pub use join::{join_all, JoinAll};
pub use select::{select, Either, Select};
pub use sequence::{and_then, sequence, AndThen, Sequence};
