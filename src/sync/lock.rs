//! Shared-resource lock with caller-dependent blocking.
//!
//! A [`SharedLock`] has exactly one holder at a time. How a caller waits for
//! it depends on who is calling:
//!
//! - **Root thread**: blocks on a condition variable, exactly like a
//!   conventional mutex. The root thread is never cancelled.
//! - **Managed task**: tries to take the lock without blocking; on failure it
//!   runs a checkpoint, sleeps one lock poll interval and retries. Deleting
//!   the task ends the wait with a cancellation error and the lock is not
//!   held.
//!
//! A held lock is never revoked by cancellation. A task deleted while holding
//! one keeps it until it reaches a checkpoint and unwinds; [`LockGuard`]
//! releases on that unwind.
//!
//! The lock is not reentrant: a holder that acquires again waits on itself.
//!
//! # Example
//!
//! ```ignore
//! use simrtos::sync::SharedLock;
//!
//! static DISPLAY: SharedLock = SharedLock::new();
//!
//! let guard = DISPLAY.lock()?;
//! draw_frame();
//! drop(guard);
//! ```

use std::fmt;

use parking_lot::{Condvar, Mutex};

use crate::cx::TaskContext;
use crate::error::Result;
use crate::tracing_compat::trace;
use crate::types::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    Free,
    Root,
    Task(TaskId),
}

/// A mutual-exclusion primitive usable by managed tasks and the root thread.
pub struct SharedLock {
    state: Mutex<Holder>,
    released: Condvar,
}

impl SharedLock {
    /// Creates an unlocked lock. Usable in `static` items.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: parking_lot::const_mutex(Holder::Free),
            released: Condvar::new(),
        }
    }

    /// Acquires the lock, waiting as long as it takes.
    ///
    /// # Errors
    ///
    /// Returns a cancellation error if the calling task is deleted while
    /// waiting; the lock is then not held. Never fails on the root thread.
    pub fn acquire(&self) -> Result<()> {
        let Some(cx) = TaskContext::current() else {
            self.acquire_blocking();
            return Ok(());
        };

        let holder = Holder::Task(cx.task_id());
        cx.poll_until(|| self.try_acquire_as(holder).then_some(()))?;
        trace!(task_id = %cx.task_id(), "lock acquired");
        Ok(())
    }

    /// Acquires the lock and returns a guard that releases it on drop.
    ///
    /// # Errors
    ///
    /// See [`acquire`](Self::acquire).
    pub fn lock(&self) -> Result<LockGuard<'_>> {
        self.acquire()?;
        Ok(LockGuard { lock: self })
    }

    /// Takes the lock if it is free. Never blocks and is not a checkpoint.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        let holder = TaskContext::current().map_or(Holder::Root, |cx| Holder::Task(cx.task_id()));
        self.try_acquire_as(holder)
    }

    /// Guard-returning form of [`try_acquire`](Self::try_acquire).
    #[must_use]
    pub fn try_lock(&self) -> Option<LockGuard<'_>> {
        self.try_acquire().then_some(LockGuard { lock: self })
    }

    /// Releases the lock. A no-op if it is not held.
    ///
    /// Any thread may release; ownership is not checked.
    pub fn release(&self) {
        let mut state = self.state.lock();
        if *state == Holder::Free {
            return;
        }
        *state = Holder::Free;
        drop(state);
        trace!("lock released");
        self.released.notify_one();
    }

    /// Returns true if the lock is currently held.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        *self.state.lock() != Holder::Free
    }

    /// Returns the task holding the lock, or `None` when it is free or held
    /// by the root thread.
    #[must_use]
    pub fn holder(&self) -> Option<TaskId> {
        match *self.state.lock() {
            Holder::Task(id) => Some(id),
            Holder::Free | Holder::Root => None,
        }
    }

    fn try_acquire_as(&self, holder: Holder) -> bool {
        let mut state = self.state.lock();
        if *state != Holder::Free {
            return false;
        }
        *state = holder;
        true
    }

    fn acquire_blocking(&self) {
        let mut state = self.state.lock();
        while *state != Holder::Free {
            self.released.wait(&mut state);
        }
        *state = Holder::Root;
    }
}

impl Default for SharedLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedLock")
            .field("holder", &*self.state.lock())
            .finish()
    }
}

/// Releases a [`SharedLock`] when dropped.
#[must_use = "guard will be immediately released if not held"]
pub struct LockGuard<'a> {
    lock: &'a SharedLock,
}

impl LockGuard<'_> {
    /// Releases the lock now.
    pub fn unlock(self) {
        drop(self);
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

impl fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").finish_non_exhaustive()
    }
}
