//! Current-task context.
//!
//! Every native thread spawned for a task carries a thread-local
//! [`TaskContext`] for as long as the task body runs. Threads without one are
//! root threads: they are never cancelled, and the checkpoint primitives give
//! them plain blocking behavior.

mod current;

pub use current::{checkpoint, current_task, is_managed, TaskContext};
#[cfg(test)]
pub(crate) use current::CurrentTaskGuard;
