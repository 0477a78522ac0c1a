//! Per-task shared state.
//!
//! A [`TaskShared`] is referenced from three places: the registry record (for
//! lookup by handle), the task's own thread-local context (for checkpoints),
//! and a deleter that has removed the record and is waiting on the join.

use parking_lot::Mutex;

use crate::cancel::CancelToken;
use crate::runtime::notify::Notification;
use crate::types::state::AtomicTaskState;
use crate::types::{TaskExit, TaskId, TaskState};

#[derive(Debug)]
pub(crate) struct TaskShared {
    pub(crate) id: TaskId,
    pub(crate) name: String,
    pub(crate) priority: u8,
    pub(crate) token: CancelToken,
    pub(crate) state: AtomicTaskState,
    pub(crate) notification: Notification,
    exit: Mutex<Option<TaskExit>>,
}

impl TaskShared {
    pub(crate) fn new(id: TaskId, name: String, priority: u8) -> Self {
        Self {
            id,
            name,
            priority,
            token: CancelToken::new(),
            state: AtomicTaskState::new(),
            notification: Notification::new(),
            exit: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> TaskState {
        self.state.load()
    }

    pub(crate) fn record_exit(&self, exit: TaskExit) {
        *self.exit.lock() = Some(exit);
        self.state.advance(TaskState::Exited);
    }

    pub(crate) fn take_exit(&self) -> Option<TaskExit> {
        self.exit.lock().take()
    }
}
