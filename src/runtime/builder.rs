//! Runtime builder and the runtime handle.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::error::Result;
use crate::runtime::config::{ConfigError, RuntimeConfig};
use crate::runtime::env_config;
use crate::runtime::notify::NotifyAction;
use crate::runtime::registry::{TaskRecord, TaskRegistry};
use crate::runtime::spawn::TaskBuilder;
use crate::sync::LockTable;
use crate::tracing_compat::{debug, error, info, warn};
use crate::types::{CancelReason, LockId, TaskExit, TaskId, TaskState};

/// Builder for constructing a runtime with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
}

impl RuntimeBuilder {
    /// Create a new builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder seeded from `SIMRTOS_*` environment variables.
    ///
    /// Setters called afterwards take precedence over the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a variable is set but
    /// unparseable.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        let mut config = RuntimeConfig::default();
        env_config::apply_env_overrides(&mut config)?;
        Ok(Self { config })
    }

    /// Create a builder from a TOML file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file can not be read or parsed, or if
    /// an environment variable is invalid.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: &std::path::Path) -> std::result::Result<Self, ConfigError> {
        let toml = env_config::parse_toml_file(path)?;
        let mut config = RuntimeConfig::default();
        env_config::apply_toml_config(&mut config, &toml);
        env_config::apply_env_overrides(&mut config)?;
        Ok(Self { config })
    }

    /// Set the slice length for cancellable sleep.
    #[must_use]
    pub fn sleep_quantum(mut self, quantum: std::time::Duration) -> Self {
        self.config.sleep_quantum = quantum;
        self
    }

    /// Set the back-off between lock attempts of a managed task.
    #[must_use]
    pub fn lock_poll_interval(mut self, interval: std::time::Duration) -> Self {
        self.config.lock_poll_interval = interval;
        self
    }

    /// Set the task thread name prefix.
    #[must_use]
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Set the default native stack size for task threads.
    #[must_use]
    pub fn thread_stack_size(mut self, size: usize) -> Self {
        self.config.thread_stack_size = size;
        self
    }

    /// Build the runtime.
    #[must_use]
    pub fn build(self) -> Runtime {
        Runtime::with_config(self.config)
    }
}

pub(crate) struct RuntimeInner {
    pub(crate) config: RuntimeConfig,
    pub(crate) registry: TaskRegistry,
    pub(crate) locks: LockTable,
}

/// A task runtime: a task registry, a lock table and their configuration.
///
/// Cloning is cheap and yields another handle to the same runtime. Tasks
/// keep their runtime alive until they exit.
#[derive(Clone)]
pub struct Runtime {
    pub(crate) inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Creates a runtime with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Creates a runtime with the given configuration, normalized.
    #[must_use]
    pub fn with_config(mut config: RuntimeConfig) -> Self {
        config.normalize();
        Self {
            inner: Arc::new(RuntimeInner {
                config,
                registry: TaskRegistry::new(),
                locks: LockTable::new(),
            }),
        }
    }

    /// Returns a builder.
    #[must_use]
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Returns the process-wide runtime, creating it from the environment on
    /// first use. It is never torn down.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<Runtime> = OnceLock::new();
        GLOBAL.get_or_init(|| match env_config::config_from_env() {
            Ok(config) => Self::with_config(config),
            Err(err) => {
                warn!(error = %err, "invalid runtime environment, using defaults");
                Self::new()
            }
        })
    }

    /// Returns the runtime configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Starts configuring a new task.
    #[must_use]
    pub fn task(&self) -> TaskBuilder<'_> {
        TaskBuilder::new(self)
    }

    /// Starts `work` on a new native thread and returns its handle.
    ///
    /// Never waits for the task to run.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`SpawnFailed`](crate::error::ErrorKind::SpawnFailed)
    /// if the host refuses to create the thread.
    pub fn create_task<F>(&self, work: F) -> Result<TaskId>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.task().spawn(work)
    }

    /// Deletes a task and waits for its thread to exit.
    ///
    /// The handle stops resolving before this returns. The task's token is
    /// signalled and its thread joined; the wait lasts until the task reaches
    /// its next checkpoint and unwinds. Returns how the task ended.
    ///
    /// Returns `None` without waiting when the handle is unknown (already
    /// deleted or exited) or names the calling task itself. A task that
    /// deletes itself is signalled and stops at its next checkpoint; joining
    /// its own thread would never finish.
    pub fn delete_task(&self, id: TaskId) -> Option<TaskExit> {
        let Some(record) = self.inner.registry.remove(id) else {
            debug!(task_id = %id, "delete on unknown task ignored");
            return None;
        };

        if is_calling_task(&record) {
            record.shared.state.advance(TaskState::CancelRequested);
            record.shared.token.signal(CancelReason::self_deleted());
            info!(task_id = %id, "task deleted itself");
            return None;
        }

        request_cancel(&record, CancelReason::deleted());
        Some(join_record(record))
    }

    /// Deletes every live task: signals all of them first, then joins them.
    ///
    /// Returns the number of tasks stopped. When called from a task of this
    /// runtime, that task is signalled but not joined.
    pub fn shutdown(&self) -> usize {
        let records = self.inner.registry.drain();
        info!(tasks = records.len(), "runtime shutdown");

        let mut to_join = Vec::with_capacity(records.len());
        for record in records {
            if is_calling_task(&record) {
                record.shared.state.advance(TaskState::CancelRequested);
                record.shared.token.signal(CancelReason::shutdown());
            } else {
                request_cancel(&record, CancelReason::shutdown());
                to_join.push(record);
            }
        }
        let joined = to_join.len();
        for record in to_join {
            join_record(record);
        }
        joined
    }

    /// Returns the lifecycle state of a live task.
    #[must_use]
    pub fn task_state(&self, id: TaskId) -> Option<TaskState> {
        self.inner.registry.shared(id).map(|shared| shared.state())
    }

    /// Returns true if `id` names a live task.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.inner.registry.contains(id)
    }

    /// Returns the handles of every live task.
    #[must_use]
    pub fn live_tasks(&self) -> Vec<TaskId> {
        self.inner.registry.ids()
    }

    /// Returns the number of live tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Updates a task's notification value.
    ///
    /// Returns false if the task is unknown, or if
    /// [`NotifyAction::SetValueWithoutOverwrite`] meets a pending
    /// notification.
    pub fn notify(&self, id: TaskId, value: u32, action: NotifyAction) -> bool {
        match self.inner.registry.shared(id) {
            Some(shared) => shared.notification.notify(value, action),
            None => {
                debug!(task_id = %id, "notify on unknown task ignored");
                false
            }
        }
    }

    /// Returns this runtime's lock table.
    #[must_use]
    pub fn locks(&self) -> &LockTable {
        &self.inner.locks
    }

    /// Creates a lock in this runtime's lock table.
    pub fn create_lock(&self) -> LockId {
        self.inner.locks.create()
    }

    /// Acquires a lock by handle. `timeout_ms` has no effect.
    ///
    /// # Errors
    ///
    /// Returns a cancellation error if the calling task is deleted while
    /// waiting.
    pub fn acquire(&self, lock: LockId, timeout_ms: u32) -> Result<()> {
        self.inner.locks.acquire(lock, timeout_ms)
    }

    /// Releases a lock by handle.
    pub fn release(&self, lock: LockId) {
        self.inner.locks.release(lock);
    }

    /// Removes a lock from the lock table.
    pub fn delete_lock(&self, lock: LockId) -> bool {
        self.inner.locks.delete(lock)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("tasks", &self.inner.registry.len())
            .field("locks", &self.inner.locks.len())
            .finish()
    }
}

fn is_calling_task(record: &TaskRecord) -> bool {
    crate::cx::TaskContext::current().is_some_and(|cx| Arc::ptr_eq(cx.shared(), &record.shared))
}

fn request_cancel(record: &TaskRecord, reason: CancelReason) {
    record.shared.state.advance(TaskState::CancelRequested);
    record.shared.token.signal(reason);
    info!(
        task_id = %record.shared.id,
        task_name = %record.shared.name,
        "task deletion requested"
    );
}

fn join_record(record: TaskRecord) -> TaskExit {
    let start = Instant::now();
    let id = record.shared.id;
    if let Some(thread) = record.thread {
        if thread.join().is_err() {
            error!(task_id = %id, "task thread terminated abnormally");
        }
    }
    info!(task_id = %id, elapsed = ?start.elapsed(), "task joined");
    record
        .shared
        .take_exit()
        .unwrap_or_else(|| TaskExit::Cancelled(record.shared.token.reason().unwrap_or_default()))
}
