//! Named process-wide buses.
//!
//! A [`SharedBus`] serializes independent call sites that drive the same
//! piece of emulated hardware, such as the display and the storage card on
//! one SPI bus. Unlike [`SharedLock`](super::SharedLock) a bus is reentrant:
//! the owning thread may lock it again while holding it and must unlock it
//! the same number of times.
//!
//! Waiting follows the same split as the shared lock. The root thread blocks;
//! a managed task polls with a checkpoint between attempts.

use std::fmt;
use std::thread::ThreadId;

use parking_lot::{Condvar, Mutex};

use crate::cx::TaskContext;
use crate::error::Result;
use crate::tracing_compat::trace;

/// The bus shared by the display and storage drivers.
pub static SPI_BUS: SharedBus = SharedBus::new("spi");

/// Locks [`SPI_BUS`] for the calling thread.
///
/// Pair every call with [`spi_bus_unlock`], or prefer `SPI_BUS.lock()`.
///
/// # Errors
///
/// Returns a cancellation error if the calling task is deleted while
/// waiting for another thread to give up the bus.
pub fn spi_bus_lock() -> Result<()> {
    SPI_BUS.acquire()
}

/// Undoes one [`spi_bus_lock`] by the calling thread.
pub fn spi_bus_unlock() {
    SPI_BUS.unlock();
}

#[derive(Debug)]
struct BusState {
    owner: Option<ThreadId>,
    depth: u32,
}

/// A named reentrant lock owned by one thread at a time.
pub struct SharedBus {
    name: &'static str,
    state: Mutex<BusState>,
    released: Condvar,
}

impl SharedBus {
    /// Creates an idle bus.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            state: parking_lot::const_mutex(BusState {
                owner: None,
                depth: 0,
            }),
            released: Condvar::new(),
        }
    }

    /// Returns the bus name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Takes the bus for the calling thread, or deepens an existing hold.
    ///
    /// # Errors
    ///
    /// Returns a cancellation error if the calling task is deleted while
    /// waiting. Never fails on the root thread or for the current owner.
    pub fn acquire(&self) -> Result<()> {
        let me = std::thread::current().id();
        if self.try_enter(me) {
            return Ok(());
        }
        match TaskContext::current() {
            Some(cx) => cx.poll_until(|| self.try_enter(me).then_some(()))?,
            None => {
                let mut state = self.state.lock();
                while state.owner.is_some() {
                    self.released.wait(&mut state);
                }
                state.owner = Some(me);
                state.depth = 1;
            }
        }
        trace!(bus = self.name, "bus acquired");
        Ok(())
    }

    /// Locks the bus and returns a guard that undoes the lock on drop.
    ///
    /// # Errors
    ///
    /// See [`acquire`](Self::acquire).
    pub fn lock(&self) -> Result<BusGuard<'_>> {
        self.acquire()?;
        Ok(BusGuard { bus: self })
    }

    /// Undoes one level of the calling thread's hold.
    ///
    /// Returns false, changing nothing, if the calling thread does not own
    /// the bus.
    pub fn unlock(&self) -> bool {
        let me = std::thread::current().id();
        let mut state = self.state.lock();
        if state.owner != Some(me) {
            return false;
        }
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            drop(state);
            trace!(bus = self.name, "bus released");
            self.released.notify_one();
        }
        true
    }

    /// Returns true if any thread holds the bus.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    /// Returns how many times the calling thread currently holds the bus.
    #[must_use]
    pub fn held_depth(&self) -> u32 {
        let state = self.state.lock();
        if state.owner == Some(std::thread::current().id()) {
            state.depth
        } else {
            0
        }
    }

    fn try_enter(&self, me: ThreadId) -> bool {
        let mut state = self.state.lock();
        match state.owner {
            None => {
                state.owner = Some(me);
                state.depth = 1;
                true
            }
            Some(owner) if owner == me => {
                state.depth += 1;
                true
            }
            Some(_) => false,
        }
    }
}

impl fmt::Debug for SharedBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SharedBus")
            .field("name", &self.name)
            .field("owner", &state.owner)
            .field("depth", &state.depth)
            .finish()
    }
}

/// Holds one level of a [`SharedBus`] lock until dropped.
#[must_use = "guard will be immediately released if not held"]
pub struct BusGuard<'a> {
    bus: &'a SharedBus,
}

impl BusGuard<'_> {
    /// Returns the bus this guard holds.
    #[must_use]
    pub fn bus(&self) -> &SharedBus {
        self.bus
    }
}

impl Drop for BusGuard<'_> {
    fn drop(&mut self) {
        self.bus.unlock();
    }
}

impl fmt::Debug for BusGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusGuard").field("bus", &self.bus.name).finish()
    }
}
