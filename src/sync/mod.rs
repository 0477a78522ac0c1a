//! Cancel-aware mutual exclusion.
//!
//! # Primitives
//!
//! - [`SharedLock`]: single-holder lock; root threads block, managed tasks
//!   poll with a checkpoint between attempts
//! - [`LockTable`]: handle table behind the emulated `CreateLock` /
//!   `Acquire` / `Release` / `DeleteLock` calls
//! - [`SharedBus`]: named reentrant lock for emulated hardware buses
//!
//! # Cancel Safety
//!
//! - Cancellation during wait: clean abort, nothing held
//! - Cancellation while holding: nothing is revoked; the task keeps the lock
//!   until its guard drops during unwind
//! - Panic while holding: guard dropped via unwind

pub mod bus;
mod lock;
mod lock_table;

pub use bus::{spi_bus_lock, spi_bus_unlock, BusGuard, SharedBus, SPI_BUS};
pub use lock::{LockGuard, SharedLock};
pub use lock_table::LockTable;
