//! Per-task cancellation flag.
//!
//! The token is the only word of state shared between a task and whoever
//! deletes it. The deleter calls [`CancelToken::signal`]; the task's own
//! thread calls [`CancelToken::check`] at every checkpoint. The flag goes
//! from clear to set once and is never reset, so a signal can not be lost:
//! every check after the store observes it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::Cancelled;
use crate::types::CancelReason;

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: AtomicBool,
    reason: OnceLock<CancelReason>,
}

/// Shared, monotonic cancellation flag.
///
/// Cloning yields another handle to the same flag.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl CancelToken {
    /// Creates a token with the flag cleared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag.
    ///
    /// Returns `true` for the call that actually set it; later calls are
    /// no-ops that keep the first reason.
    pub fn signal(&self, reason: CancelReason) -> bool {
        // The reason is published before the flag so a thread that sees the
        // flag can always read it.
        let _ = self.inner.reason.set(reason);
        !self.inner.cancelled.swap(true, Ordering::AcqRel)
    }

    /// Returns true once the flag has been set.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Returns the reason recorded by the first signal, if any.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        if self.is_cancelled() {
            self.inner.reason.get().cloned()
        } else {
            None
        }
    }

    /// Reads the flag, failing with [`Cancelled`] when it is set.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled {
                reason: self.inner.reason.get().cloned().unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Returns true if both handles refer to the same flag.
    #[must_use]
    pub fn same_token(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.inner.reason.get())
            .finish()
    }
}
