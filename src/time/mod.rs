//! Cancellable sleep.
//!
//! A managed task sleeps in slices of its runtime's sleep quantum and checks
//! its cancellation token between slices, so deletion latency is bounded by
//! one quantum however long the requested delay is. Root threads sleep
//! the whole duration in one call.
//!
//! # Example
//!
//! ```ignore
//! use simrtos::time::sleep_ms;
//!
//! runtime.create_task(|| loop {
//!     poll_buttons();
//!     sleep_ms(50)?;
//! })?;
//! ```

mod sleep;

pub use sleep::{sleep, sleep_ms};
