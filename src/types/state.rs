//! Task lifecycle state and exit outcomes.

use super::cancel::CancelReason;
use crate::error::Error;
use core::fmt;
use std::any::Any;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a managed task.
///
/// ```text
///   Running ──delete──► CancelRequested ──unwind──► Exited
///      │                                              ▲
///      └───────────────── body returns ───────────────┘
/// ```
///
/// Transitions only move rightwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// The body is executing and nobody has asked it to stop.
    Running,
    /// Deletion signalled the token; the body has not unwound yet.
    CancelRequested,
    /// The body has returned and the thread is finishing.
    Exited,
}

impl TaskState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::CancelRequested => 1,
            Self::Exited => 2,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::CancelRequested,
            _ => Self::Exited,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::CancelRequested => write!(f, "cancel-requested"),
            Self::Exited => write!(f, "exited"),
        }
    }
}

/// Atomic holder for a [`TaskState`] that never moves backwards.
#[derive(Debug)]
pub(crate) struct AtomicTaskState(AtomicU8);

impl AtomicTaskState {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(TaskState::Running.as_u8()))
    }

    pub(crate) fn load(&self) -> TaskState {
        TaskState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Advances to `next` if it is later than the current state.
    ///
    /// Returns the state that was current before the call.
    pub(crate) fn advance(&self, next: TaskState) -> TaskState {
        TaskState::from_u8(self.0.fetch_max(next.as_u8(), Ordering::AcqRel))
    }
}

/// Message extracted from a caught panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicPayload {
    message: String,
}

impl PanicPayload {
    /// Creates a payload with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Extracts a message from a `catch_unwind` payload.
    #[must_use]
    pub fn from_any(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&'static str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self { message }
    }

    /// Returns the panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panic: {}", self.message)
    }
}

/// How a task body ended.
#[derive(Debug, Clone)]
pub enum TaskExit {
    /// The body returned `Ok(())`.
    Completed,
    /// The body observed cancellation at a checkpoint and unwound.
    Cancelled(CancelReason),
    /// The body returned an error other than cancellation.
    Failed(Error),
    /// The body panicked.
    Panicked(PanicPayload),
}

impl TaskExit {
    /// Returns true if the body ran to completion.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the body unwound because of cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

impl fmt::Display for TaskExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Cancelled(reason) => write!(f, "cancelled ({reason})"),
            Self::Failed(err) => write!(f, "failed: {err}"),
            Self::Panicked(payload) => write!(f, "{payload}"),
        }
    }
}
