//! simrtos: cooperative task cancellation for an emulated RTOS task/mutex API.
//!
//! # Overview
//!
//! Firmware written against an RTOS expects `delete task` to stop a task at
//! once, even while it waits for a mutex held by the deleting thread. Host
//! threads can not be killed or interrupted, so simrtos runs every emulated
//! task on its own native thread and makes each blocking point a
//! cancellable checkpoint. Deletion signals the task's token and joins its
//! thread; the task observes the signal at its next checkpoint and unwinds.
//!
//! # Core Guarantees
//!
//! - **Bounded deletion**: a sleeping task stops within one sleep quantum, a
//!   task waiting for a lock within one poll interval
//! - **No revocation**: a held lock is never taken away by cancellation
//! - **No deadlock against the deleter**: a task never waits on a lock
//!   without polling its token, so the deleter may hold that lock
//! - **Root threads are plain**: threads not spawned by the runtime block
//!   normally and are never cancelled
//! - **Stale handles are inert**: deleted handles never alias new tasks, and
//!   operations on unknown handles are no-ops
//!
//! # Cancellation Model
//!
//! Checkpoints return [`Result`]. When a task has been deleted they return an
//! error of kind [`ErrorKind::Cancelled`]; task bodies forward it with `?`
//! and the spawn wrapper discards it. Nothing else interprets it.
//!
//! # Module Structure
//!
//! - [`types`]: handles, cancellation reasons, lifecycle states
//! - [`cancel`]: cancellation tokens
//! - [`cx`]: thread-local current-task context and explicit checkpoints
//! - [`time`]: cancellable sleep
//! - [`sync`]: shared locks, the lock table and named buses
//! - [`runtime`]: task registry, lifecycle manager, configuration
//! - [`rtos`]: RTOS-style free functions over the process-wide runtime
//! - [`error`]: error types
//! - [`util`]: generational arena

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod cancel;
pub mod cx;
pub mod error;
pub mod rtos;
pub mod runtime;
pub mod sync;
pub mod time;
pub mod tracing_compat;
pub mod types;
pub mod util;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cancel::CancelToken;
pub use cx::{checkpoint, current_task, is_managed, TaskContext};
pub use error::{Cancelled, Error, ErrorCategory, ErrorKind, Result, ResultExt};
pub use runtime::{NotifyAction, Runtime, RuntimeBuilder, RuntimeConfig, TaskBuilder};
pub use sync::{LockGuard, SharedBus, SharedLock};
pub use types::{CancelKind, CancelReason, LockId, PanicPayload, TaskExit, TaskId, TaskState};
