//! Per-runtime table of live tasks.
//!
//! Records live in a generational arena behind one mutex. The mutex guards
//! bookkeeping only: nobody joins or waits for a lock while holding it.
//! Handles carry the registry's scope, so a handle issued by another runtime
//! never resolves.
//!
//! Removal is the single point of ownership transfer. Whichever of the spawn
//! wrapper (self-exit) or a deleter removes a record first owns its join
//! handle; the loser sees `None`. That keeps self-exit and delete from
//! leaking a record or joining twice.

use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::runtime::task::TaskShared;
use crate::types::id::Scope;
use crate::types::TaskId;
use crate::util::{Arena, ArenaIndex};

/// A registry entry.
#[derive(Debug)]
pub(crate) struct TaskRecord {
    pub(crate) shared: Arc<TaskShared>,
    pub(crate) thread: Option<JoinHandle<()>>,
}

/// Table of live tasks addressed by [`TaskId`].
#[derive(Debug)]
pub(crate) struct TaskRegistry {
    scope: Scope,
    tasks: Mutex<Arena<TaskRecord>>,
}

impl TaskRegistry {
    pub(crate) fn new() -> Self {
        Self {
            scope: Scope::next(),
            tasks: Mutex::new(Arena::new()),
        }
    }

    /// Maps a handle to its slot, or `None` if another table issued it.
    fn slot(&self, id: TaskId) -> Option<ArenaIndex> {
        (id.scope() == self.scope).then_some(id.arena_index())
    }

    /// Allocates a handle, builds the task's shared state and starts its
    /// thread with `spawn`, all under the registry lock.
    ///
    /// The new thread cannot remove its own record before the join handle is
    /// stored. If `spawn` fails the record is dropped again and the handle is
    /// never observable.
    pub(crate) fn insert_spawned<S>(
        &self,
        name: String,
        priority: u8,
        spawn: S,
    ) -> Result<Arc<TaskShared>>
    where
        S: FnOnce(Arc<TaskShared>) -> std::io::Result<JoinHandle<()>>,
    {
        let scope = self.scope;
        let mut tasks = self.tasks.lock();
        let index = tasks.insert_with(|index| TaskRecord {
            shared: Arc::new(TaskShared::new(TaskId::from_arena(scope, index), name, priority)),
            thread: None,
        });
        let shared = match tasks.get(index) {
            Some(record) => Arc::clone(&record.shared),
            None => return Err(Error::internal("task record vanished during insert")),
        };

        match spawn(Arc::clone(&shared)) {
            Ok(thread) => {
                if let Some(record) = tasks.get_mut(index) {
                    record.thread = Some(thread);
                }
                Ok(shared)
            }
            Err(err) => {
                tasks.remove(index);
                Err(Error::spawn_failed(err).with_task(shared.id))
            }
        }
    }

    /// Removes the record for `id`, transferring ownership of its thread.
    pub(crate) fn remove(&self, id: TaskId) -> Option<TaskRecord> {
        let index = self.slot(id)?;
        self.tasks.lock().remove(index)
    }

    /// Returns the shared state of a live task.
    pub(crate) fn shared(&self, id: TaskId) -> Option<Arc<TaskShared>> {
        let index = self.slot(id)?;
        self.tasks
            .lock()
            .get(index)
            .map(|record| Arc::clone(&record.shared))
    }

    pub(crate) fn contains(&self, id: TaskId) -> bool {
        self.slot(id)
            .is_some_and(|index| self.tasks.lock().contains(index))
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub(crate) fn ids(&self) -> Vec<TaskId> {
        self.tasks
            .lock()
            .iter()
            .map(|(index, _)| TaskId::from_arena(self.scope, index))
            .collect()
    }

    /// Removes every record at once.
    pub(crate) fn drain(&self) -> Vec<TaskRecord> {
        self.tasks
            .lock()
            .drain()
            .into_iter()
            .map(|(_, record)| record)
            .collect()
    }
}
