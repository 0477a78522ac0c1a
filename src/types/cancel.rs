//! Cancellation reason and kind types.
//!
//! A task is only ever cancelled by deletion, but deletion arrives from
//! different places. The reason travels with the [`Cancelled`](crate::error::Cancelled)
//! marker so logs can tell them apart.

use core::fmt;

/// Who asked for the task to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CancelKind {
    /// Another thread deleted the task by handle.
    Deleted,
    /// The task deleted its own handle.
    SelfDeleted,
    /// The owning runtime is shutting down and deleting every task.
    Shutdown,
}

impl fmt::Display for CancelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => write!(f, "deleted"),
            Self::SelfDeleted => write!(f, "self-deleted"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// The reason for a cancellation, including kind and optional context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReason {
    /// The kind of cancellation.
    pub kind: CancelKind,
    /// Optional static message.
    pub message: Option<&'static str>,
}

impl CancelReason {
    /// Creates a reason with the given kind and no message.
    #[must_use]
    pub const fn new(kind: CancelKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// External deletion by handle.
    #[must_use]
    pub const fn deleted() -> Self {
        Self::new(CancelKind::Deleted)
    }

    /// The task deleted itself.
    #[must_use]
    pub const fn self_deleted() -> Self {
        Self::new(CancelKind::SelfDeleted)
    }

    /// Runtime shutdown.
    #[must_use]
    pub const fn shutdown() -> Self {
        Self::new(CancelKind::Shutdown)
    }

    /// Attaches a message.
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    /// Returns the kind of this cancellation reason.
    #[must_use]
    pub const fn kind(&self) -> CancelKind {
        self.kind
    }
}

impl Default for CancelReason {
    fn default() -> Self {
        Self::deleted()
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(msg) = self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}
