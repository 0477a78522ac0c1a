//! Sliced sleep with a cancellation check at every slice boundary.

use std::time::{Duration, Instant};

use crate::cx::TaskContext;
use crate::error::Result;

/// Sleeps for `duration`, aborting early if the calling task is deleted.
///
/// A duration too long to express as a deadline (such as `Duration::MAX`)
/// sleeps until the task is deleted.
///
/// # Errors
///
/// Returns a cancellation error if the task is deleted before or during the
/// sleep. Never fails on a root thread.
pub fn sleep(duration: Duration) -> Result<()> {
    let Some(cx) = TaskContext::current() else {
        std::thread::sleep(duration);
        return Ok(());
    };

    cx.checkpoint()?;
    let quantum = cx.sleep_quantum();
    let Some(deadline) = Instant::now().checked_add(duration) else {
        loop {
            std::thread::sleep(quantum);
            cx.checkpoint()?;
        }
    };
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(());
        }
        std::thread::sleep(remaining.min(quantum));
        cx.checkpoint()?;
    }
}

/// Millisecond form of [`sleep`].
///
/// # Errors
///
/// See [`sleep`].
pub fn sleep_ms(ms: u32) -> Result<()> {
    sleep(Duration::from_millis(u64::from(ms)))
}
