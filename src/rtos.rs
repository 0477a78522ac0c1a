//! RTOS-style free functions over the process-wide runtime.
//!
//! Each function forwards to [`Runtime::global`]. Handles are plain values
//! and unknown handles are silent no-ops, matching the fire-and-forget style
//! of the emulated API.
//!
//! ```ignore
//! use simrtos::rtos;
//!
//! let bus = rtos::create_lock();
//! let worker = rtos::create_task("render", 4096, 1, move || loop {
//!     rtos::acquire(bus, rtos::MAX_DELAY)?;
//!     draw();
//!     rtos::release(bus);
//!     rtos::task_delay(16)?;
//! })?;
//!
//! rtos::delete_task(worker);
//! ```

use crate::error::Result;
use crate::runtime::{NotifyAction, Runtime};
use crate::types::{LockId, TaskId};

/// The "wait forever" timeout value. Timeouts have no effect in this runtime.
pub const MAX_DELAY: u32 = u32::MAX;

/// Creates a named task.
///
/// `stack_depth` overrides the runtime's native stack size when non-zero.
/// `priority` is recorded and otherwise ignored.
///
/// # Errors
///
/// Returns an error of kind [`SpawnFailed`](crate::error::ErrorKind::SpawnFailed)
/// if the host refuses to create the thread.
pub fn create_task<F>(name: &str, stack_depth: usize, priority: u8, work: F) -> Result<TaskId>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    Runtime::global()
        .task()
        .name(name)
        .stack_size(stack_depth)
        .priority(priority)
        .spawn(work)
}

/// Deletes a task and waits for it to exit. Unknown handles are ignored.
pub fn delete_task(task: TaskId) {
    Runtime::global().delete_task(task);
}

/// Sleeps for `ms` milliseconds. A checkpoint inside a task.
///
/// # Errors
///
/// Returns a cancellation error if the calling task is deleted.
pub fn task_delay(ms: u32) -> Result<()> {
    crate::time::sleep_ms(ms)
}

/// Creates a lock in the process-wide lock table.
#[must_use]
pub fn create_lock() -> LockId {
    Runtime::global().create_lock()
}

/// Acquires a lock. `timeout_ms` is accepted and ignored; the call waits
/// until the lock is taken or the calling task is deleted.
///
/// # Errors
///
/// Returns a cancellation error if the calling task is deleted while
/// waiting.
pub fn acquire(lock: LockId, timeout_ms: u32) -> Result<()> {
    Runtime::global().acquire(lock, timeout_ms)
}

/// Releases a lock. Unknown handles and unheld locks are ignored.
pub fn release(lock: LockId) {
    Runtime::global().release(lock);
}

/// Removes a lock from the lock table. Unknown handles are ignored.
pub fn delete_lock(lock: LockId) {
    Runtime::global().delete_lock(lock);
}

/// Updates a task's notification value. See [`NotifyAction`].
pub fn task_notify(task: TaskId, value: u32, action: NotifyAction) -> bool {
    Runtime::global().notify(task, value, action)
}

/// Waits for the calling task's notification value to become non-zero.
/// `timeout_ms` is accepted and ignored.
///
/// # Errors
///
/// Returns a cancellation error if the calling task is deleted while
/// waiting.
pub fn notify_take(clear_on_exit: bool, timeout_ms: u32) -> Result<u32> {
    let _ = timeout_ms;
    crate::runtime::notify_take(clear_on_exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    #[test]
    fn lock_round_trip_from_root() {
        let lock = create_lock();
        acquire(lock, 0).unwrap();
        release(lock);
        release(lock);
        delete_lock(lock);
        delete_lock(lock);
    }

    #[test]
    fn task_round_trip_on_global_runtime() {
        crate::test_utils::init_test_logging();
        let (tx, rx) = mpsc::channel();
        let task = create_task("notified", 0, 2, move || {
            let value = notify_take(false, MAX_DELAY)?;
            tx.send(value).ok();
            loop {
                task_delay(1_000)?;
            }
        })
        .unwrap();

        assert!(task_notify(task, 0, NotifyAction::Increment));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);

        let start = Instant::now();
        delete_task(task);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!Runtime::global().contains(task));
        delete_task(task);
    }
}
