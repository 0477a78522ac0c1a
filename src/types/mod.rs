//! Core types: handles, cancellation reasons, lifecycle states.

pub mod cancel;
pub mod id;
pub mod state;

pub use cancel::{CancelKind, CancelReason};
pub use id::{LockId, TaskId};
pub use state::{PanicPayload, TaskExit, TaskState};
