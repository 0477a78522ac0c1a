//! Thread-local binding of the task a native thread is running.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::runtime::config::Timing;
use crate::runtime::task::TaskShared;
use crate::tracing_compat::{debug, trace};
use crate::types::{TaskId, TaskState};

thread_local! {
    static CURRENT_TASK: RefCell<Option<TaskContext>> = const { RefCell::new(None) };
}

/// Guard that restores the previous context on drop.
pub(crate) struct CurrentTaskGuard {
    prev: Option<TaskContext>,
}

impl Drop for CurrentTaskGuard {
    fn drop(&mut self) {
        let prev = self.prev.take();
        CURRENT_TASK.with(|slot| {
            *slot.borrow_mut() = prev;
        });
    }
}

/// The managed task the calling thread is running.
///
/// Obtained with [`TaskContext::current`]; root threads get `None`.
#[derive(Clone)]
pub struct TaskContext {
    task: Arc<TaskShared>,
    timing: Timing,
}

impl TaskContext {
    pub(crate) fn new(task: Arc<TaskShared>, timing: Timing) -> Self {
        Self { task, timing }
    }

    /// Returns the context bound to the calling thread, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT_TASK.with(|slot| slot.borrow().clone())
    }

    /// Binds `cx` to the calling thread until the guard is dropped.
    #[must_use]
    pub(crate) fn set_current(cx: Option<Self>) -> CurrentTaskGuard {
        let prev = CURRENT_TASK.with(|slot| {
            let mut guard = slot.borrow_mut();
            let prev = guard.take();
            *guard = cx;
            prev
        });
        CurrentTaskGuard { prev }
    }

    /// Returns the handle of this task.
    #[must_use]
    pub fn task_id(&self) -> TaskId {
        self.task.id
    }

    /// Returns the name the task was created with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.task.name
    }

    /// Returns the priority the task was created with.
    ///
    /// Recorded for diagnostics only; it has no scheduling effect.
    #[must_use]
    pub fn priority(&self) -> u8 {
        self.task.priority
    }

    /// Returns the lifecycle state of this task.
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.task.state()
    }

    /// Returns true if deletion has been requested.
    ///
    /// Unlike [`checkpoint`](Self::checkpoint) this only peeks; it is for task
    /// bodies that want to wind down on their own terms.
    #[must_use]
    pub fn is_cancel_requested(&self) -> bool {
        self.task.token.is_cancelled()
    }

    /// Slice length used by cancellable sleep for this task.
    #[must_use]
    pub fn sleep_quantum(&self) -> Duration {
        self.timing.sleep_quantum
    }

    /// Back-off between lock acquisition attempts for this task.
    #[must_use]
    pub fn lock_poll_interval(&self) -> Duration {
        self.timing.lock_poll_interval
    }

    /// Checks whether this task has been deleted.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`ErrorKind::Cancelled`](crate::error::ErrorKind::Cancelled)
    /// once the task's token is set. The caller must stop its current work
    /// and propagate the error.
    pub fn checkpoint(&self) -> Result<()> {
        trace!(task_id = %self.task.id, "checkpoint");
        self.task.token.check().map_err(|cancelled| {
            debug!(
                task_id = %self.task.id,
                task_name = %self.task.name,
                reason = %cancelled.reason,
                "checkpoint observed cancellation"
            );
            Error::from(cancelled).with_task(self.task.id)
        })
    }

    /// Retries `attempt` until it yields a value, running a checkpoint and
    /// sleeping one lock poll interval after every miss.
    pub(crate) fn poll_until<T>(&self, mut attempt: impl FnMut() -> Option<T>) -> Result<T> {
        loop {
            if let Some(value) = attempt() {
                return Ok(value);
            }
            trace!(task_id = %self.task.id, "poll missed");
            self.checkpoint()?;
            std::thread::sleep(self.timing.lock_poll_interval);
        }
    }

    pub(crate) fn shared(&self) -> &Arc<TaskShared> {
        &self.task
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("task_id", &self.task.id)
            .field("name", &self.task.name)
            .field("state", &self.task.state())
            .field("timing", &self.timing)
            .finish()
    }
}

/// Checks the calling thread's task for cancellation.
///
/// A no-op returning `Ok(())` on root threads.
///
/// # Errors
///
/// See [`TaskContext::checkpoint`].
pub fn checkpoint() -> Result<()> {
    TaskContext::current().map_or(Ok(()), |cx| cx.checkpoint())
}

/// Returns the handle of the task the calling thread is running.
#[must_use]
pub fn current_task() -> Option<TaskId> {
    CURRENT_TASK.with(|slot| slot.borrow().as_ref().map(TaskContext::task_id))
}

/// Returns true when called from a managed task's thread.
#[must_use]
pub fn is_managed() -> bool {
    CURRENT_TASK.with(|slot| slot.borrow().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CancelReason;

    fn test_cx(index: u32) -> TaskContext {
        let id = TaskId::new_for_test(index, 0);
        let shared = Arc::new(TaskShared::new(id, format!("test-{index}"), 0));
        TaskContext::new(shared, Timing::default())
    }

    #[test]
    fn root_thread_has_no_context() {
        assert!(TaskContext::current().is_none());
        assert!(!is_managed());
        assert!(current_task().is_none());
        assert!(checkpoint().is_ok());
    }

    #[test]
    fn guard_binds_and_restores() {
        let outer = test_cx(1);
        let inner = test_cx(2);

        let outer_guard = TaskContext::set_current(Some(outer));
        assert_eq!(current_task(), Some(TaskId::new_for_test(1, 0)));
        {
            let _inner_guard = TaskContext::set_current(Some(inner));
            assert_eq!(current_task(), Some(TaskId::new_for_test(2, 0)));
        }
        assert_eq!(current_task(), Some(TaskId::new_for_test(1, 0)));
        drop(outer_guard);
        assert!(!is_managed());
    }

    #[test]
    fn checkpoint_fails_after_signal() {
        let cx = test_cx(3);
        let _guard = TaskContext::set_current(Some(cx.clone()));
        assert!(checkpoint().is_ok());

        cx.shared().token.signal(CancelReason::deleted());
        assert!(cx.is_cancel_requested());
        let err = checkpoint().expect_err("cancelled");
        assert!(err.is_cancelled());
        assert_eq!(err.task_id(), Some(cx.task_id()));
    }

    #[test]
    fn context_is_per_thread() {
        let _guard = TaskContext::set_current(Some(test_cx(4)));
        let seen = std::thread::spawn(is_managed).join().expect("thread panicked");
        assert!(!seen);
        assert!(is_managed());
    }
}
