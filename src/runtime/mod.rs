//! Task lifecycle management.
//!
//! - [`config`]: runtime configuration types
//! - [`env_config`]: environment variable and TOML config loading
//! - [`builder`]: [`RuntimeBuilder`] and the [`Runtime`] handle
//! - [`notify`]: per-task notification word
//!
//! A [`Runtime`] owns a task registry and a lock table. Each task runs on its
//! own native thread, scheduled by the host; the runtime adds no scheduling
//! policy, only cooperative cancellation and exclusion.
//!
//! # Quick Start
//!
//! ```ignore
//! use simrtos::runtime::Runtime;
//! use simrtos::time::sleep_ms;
//!
//! let runtime = Runtime::new();
//! let blinker = runtime.create_task(|| loop {
//!     toggle_led();
//!     sleep_ms(500)?;
//! })?;
//!
//! // Returns within one sleep quantum.
//! runtime.delete_task(blinker);
//! ```
//!
//! # Deletion
//!
//! `delete_task` removes the handle, signals the task's token and joins its
//! thread. The task stops at its next checkpoint (sleep, lock acquisition,
//! notification wait or an explicit [`checkpoint`](crate::cx::checkpoint)).
//! A task that never reaches a checkpoint can not be stopped, and deleting it
//! waits for as long as it runs.
//!
//! A task that returns on its own removes its handle as it exits, so
//! handles of finished tasks do not leak and a later delete is a no-op.

pub mod builder;
pub mod config;
pub mod env_config;
pub mod notify;
pub(crate) mod registry;
mod spawn;
pub(crate) mod task;

pub use builder::{Runtime, RuntimeBuilder};
pub use config::{ConfigError, RuntimeConfig, Timing};
pub use notify::{notify_take, NotifyAction};
pub use spawn::TaskBuilder;
