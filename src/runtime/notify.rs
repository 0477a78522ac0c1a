//! Per-task notification word.
//!
//! Every task owns one `u32` notification value and a pending bit. Other
//! threads update it with [`NotifyAction`]s; the task itself waits for it to
//! become non-zero with [`notify_take`], which is a checkpoint.

use parking_lot::Mutex;

use crate::cx::TaskContext;
use crate::error::Result;
use crate::tracing_compat::trace;

/// How a notification updates the target's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyAction {
    /// Mark a notification pending without touching the value.
    NoAction,
    /// OR the given bits into the value.
    SetBits,
    /// Increment the value by one; the given value is ignored.
    Increment,
    /// Replace the value unconditionally.
    SetValueWithOverwrite,
    /// Replace the value only if no notification is pending.
    SetValueWithoutOverwrite,
}

#[derive(Debug, Default)]
struct NotifyState {
    value: u32,
    pending: bool,
}

#[derive(Debug, Default)]
pub(crate) struct Notification {
    state: Mutex<NotifyState>,
}

impl Notification {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Applies `action`. Returns `false` only when
    /// [`NotifyAction::SetValueWithoutOverwrite`] meets a pending notification.
    pub(crate) fn notify(&self, value: u32, action: NotifyAction) -> bool {
        let mut state = self.state.lock();
        match action {
            NotifyAction::NoAction => {}
            NotifyAction::SetBits => state.value |= value,
            NotifyAction::Increment => state.value = state.value.wrapping_add(1),
            NotifyAction::SetValueWithOverwrite => state.value = value,
            NotifyAction::SetValueWithoutOverwrite => {
                if state.pending {
                    return false;
                }
                state.value = value;
            }
        }
        state.pending = true;
        true
    }

    /// Takes the value if it is non-zero, then clears or decrements it.
    pub(crate) fn try_take(&self, clear_on_exit: bool) -> Option<u32> {
        let mut state = self.state.lock();
        if state.value == 0 {
            return None;
        }
        let taken = state.value;
        state.value = if clear_on_exit { 0 } else { taken - 1 };
        state.pending = false;
        Some(taken)
    }

    #[cfg(test)]
    pub(crate) fn value(&self) -> u32 {
        self.state.lock().value
    }
}

/// Waits until the calling task's notification value is non-zero.
///
/// Returns the value observed before it was cleared (`clear_on_exit`) or
/// decremented. Root threads have no notification word and get `Ok(0)`
/// immediately.
///
/// There is no timeout: the wait ends on a notification or on cancellation.
///
/// # Errors
///
/// Returns a cancellation error if the task is deleted while waiting.
pub fn notify_take(clear_on_exit: bool) -> Result<u32> {
    let Some(cx) = TaskContext::current() else {
        return Ok(0);
    };
    let notification = &cx.shared().notification;
    let value = cx.poll_until(|| notification.try_take(clear_on_exit))?;
    trace!(task_id = %cx.task_id(), value, "notification taken");
    Ok(value)
}
