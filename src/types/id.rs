//! Handle types for runtime entities.
//!
//! Handles are opaque to callers. Internally they wrap generational arena
//! indices, so a handle whose task or lock is gone never aliases a newer one
//! that happens to reuse the same slot. Each handle also carries the scope of
//! the table that issued it: two runtimes never accept each other's handles.

use crate::util::ArenaIndex;
use core::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identity of the table that issued a handle.
///
/// Scope zero is never issued, so test handles resolve nowhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Scope(u32);

impl Scope {
    pub(crate) const UNISSUED: Self = Self(0);

    /// Allocates a scope no other table in the process holds.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a managed task.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId {
    scope: Scope,
    index: ArenaIndex,
}

impl TaskId {
    #[must_use]
    pub(crate) const fn from_arena(scope: Scope, index: ArenaIndex) -> Self {
        Self { scope, index }
    }

    #[must_use]
    pub(crate) const fn arena_index(self) -> ArenaIndex {
        self.index
    }

    #[must_use]
    pub(crate) const fn scope(self) -> Scope {
        self.scope
    }

    /// Creates a task ID for testing purposes.
    ///
    /// The ID is not registered anywhere, so every runtime treats it as an
    /// unknown handle.
    #[doc(hidden)]
    #[must_use]
    pub const fn new_for_test(index: u32, generation: u32) -> Self {
        Self::from_arena(Scope::UNISSUED, ArenaIndex::new(index, generation))
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TaskId({}:{}@{})",
            self.index.index(),
            self.index.generation(),
            self.scope
        )
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}.{}@{}", self.index.index(), self.index.generation(), self.scope)
    }
}

/// Opaque handle to a lock created through the lock table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockId {
    scope: Scope,
    index: ArenaIndex,
}

impl LockId {
    #[must_use]
    pub(crate) const fn from_arena(scope: Scope, index: ArenaIndex) -> Self {
        Self { scope, index }
    }

    #[must_use]
    pub(crate) const fn arena_index(self) -> ArenaIndex {
        self.index
    }

    #[must_use]
    pub(crate) const fn scope(self) -> Scope {
        self.scope
    }

    /// Creates a lock ID for testing purposes.
    #[doc(hidden)]
    #[must_use]
    pub const fn new_for_test(index: u32, generation: u32) -> Self {
        Self::from_arena(Scope::UNISSUED, ArenaIndex::new(index, generation))
    }
}

impl fmt::Debug for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LockId({}:{}@{})",
            self.index.index(),
            self.index.generation(),
            self.scope
        )
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}.{}@{}", self.index.index(), self.index.generation(), self.scope)
    }
}
