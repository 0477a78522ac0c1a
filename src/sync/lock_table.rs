//! Handle table for locks created through the emulated API.
//!
//! Handles carry the table's scope; a handle from another table is treated
//! as unknown.
//!
//! Locks live in a generational arena behind a short-lived table mutex. The
//! table mutex is never held while waiting for a lock: a lookup clones the
//! lock's `Arc` and the wait happens outside.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::sync::SharedLock;
use crate::tracing_compat::debug;
use crate::types::id::Scope;
use crate::types::LockId;
use crate::util::{Arena, ArenaIndex};

/// Table of [`SharedLock`]s addressed by [`LockId`].
#[derive(Debug)]
pub struct LockTable {
    scope: Scope,
    locks: Mutex<Arena<Arc<SharedLock>>>,
}

impl LockTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scope: Scope::next(),
            locks: Mutex::new(Arena::new()),
        }
    }

    fn slot(&self, id: LockId) -> Option<ArenaIndex> {
        (id.scope() == self.scope).then_some(id.arena_index())
    }

    /// Creates a new unlocked lock and returns its handle.
    pub fn create(&self) -> LockId {
        let index = self.locks.lock().insert(Arc::new(SharedLock::new()));
        let id = LockId::from_arena(self.scope, index);
        debug!(lock_id = ?id, "lock created");
        id
    }

    /// Returns the lock behind `id`, if it exists.
    #[must_use]
    pub fn get(&self, id: LockId) -> Option<Arc<SharedLock>> {
        let index = self.slot(id)?;
        self.locks.lock().get(index).cloned()
    }

    /// Acquires the lock behind `id`.
    ///
    /// `timeout_ms` is accepted for API compatibility and has no effect: the
    /// call waits until the lock is taken or the calling task is deleted.
    /// Unknown handles return immediately.
    ///
    /// # Errors
    ///
    /// Returns a cancellation error if the calling task is deleted while
    /// waiting.
    pub fn acquire(&self, id: LockId, timeout_ms: u32) -> Result<()> {
        let _ = timeout_ms;
        let Some(lock) = self.get(id) else {
            debug!(lock_id = ?id, "acquire on unknown lock ignored");
            return Ok(());
        };
        lock.acquire()
    }

    /// Releases the lock behind `id`. Unknown handles and unheld locks are
    /// no-ops.
    pub fn release(&self, id: LockId) {
        match self.get(id) {
            Some(lock) => lock.release(),
            None => debug!(lock_id = ?id, "release on unknown lock ignored"),
        }
    }

    /// Removes the lock behind `id` from the table.
    ///
    /// Callers already waiting on it keep their reference and finish
    /// normally; later lookups miss. Returns false for unknown handles.
    pub fn delete(&self, id: LockId) -> bool {
        let removed = self
            .slot(id)
            .is_some_and(|index| self.locks.lock().remove(index).is_some());
        debug!(lock_id = ?id, removed, "lock deleted");
        removed
    }

    /// Returns true if `id` names a live lock.
    #[must_use]
    pub fn contains(&self, id: LockId) -> bool {
        self.slot(id)
            .is_some_and(|index| self.locks.lock().contains(index))
    }

    /// Returns the number of live locks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Returns true if no locks exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_acquire_release_round_trip() {
        crate::test_utils::init_test_logging();
        let table = LockTable::new();
        let id = table.create();
        assert!(table.contains(id));

        table.acquire(id, 0).unwrap();
        assert!(table.get(id).unwrap().is_locked());
        table.release(id);
        assert!(!table.get(id).unwrap().is_locked());
        table.release(id);
    }

    #[test]
    fn unknown_handles_are_no_ops() {
        let table = LockTable::new();
        let ghost = LockId::new_for_test(9, 3);
        assert!(table.acquire(ghost, 100).is_ok());
        table.release(ghost);
        assert!(!table.delete(ghost));
        assert!(table.is_empty());
    }

    #[test]
    fn handles_from_another_table_are_unknown() {
        let ours = LockTable::new();
        let theirs = LockTable::new();
        let mine = ours.create();
        let foreign = theirs.create();
        assert_ne!(mine, foreign);

        theirs.acquire(foreign, 0).unwrap();
        assert!(ours.get(foreign).is_none());
        ours.release(foreign);
        assert!(theirs.get(foreign).unwrap().is_locked());
        assert!(!ours.delete(foreign));
        assert!(theirs.contains(foreign));
        assert!(ours.contains(mine));
        theirs.release(foreign);
    }

    #[test]
    fn deleted_handle_is_never_reused() {
        let table = LockTable::new();
        let first = table.create();
        assert!(table.delete(first));
        assert!(!table.delete(first));

        let second = table.create();
        assert_ne!(first, second);
        assert!(!table.contains(first));
        assert!(table.contains(second));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn timeout_does_not_bound_the_wait() {
        let table = Arc::new(LockTable::new());
        let id = table.create();
        table.acquire(id, 0).unwrap();

        let waiter = {
            let table = Arc::clone(&table);
            std::thread::spawn(move || {
                table.acquire(id, 1).unwrap();
                table.release(id);
            })
        };
        std::thread::sleep(std::time::Duration::from_millis(30));
        assert!(!waiter.is_finished(), "a 1 ms timeout must not end the wait");
        table.release(id);
        waiter.join().unwrap();
    }
}
