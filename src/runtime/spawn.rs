//! Task creation and the spawn wrapper.
//!
//! The wrapper is the outermost frame of every task thread. It binds the
//! thread-local context, runs the body, and is the only place that
//! interprets a cancellation error: it is recorded as the task's exit and
//! discarded. Other errors and panics are logged and recorded too; nothing
//! escapes the thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::cx::TaskContext;
use crate::error::Result;
use crate::runtime::builder::{Runtime, RuntimeInner};
use crate::runtime::task::TaskShared;
use crate::tracing_compat::{debug, error, warn};
use crate::types::{PanicPayload, TaskExit, TaskId};

/// Configures one task before it is started.
///
/// Obtained from [`Runtime::task`].
///
/// ```ignore
/// let id = runtime
///     .task()
///     .name("display")
///     .stack_size(64 * 1024)
///     .spawn(|| loop {
///         refresh();
///         simrtos::time::sleep_ms(16)?;
///     })?;
/// ```
#[derive(Debug)]
#[must_use = "a task builder does nothing until spawned"]
pub struct TaskBuilder<'rt> {
    runtime: &'rt Runtime,
    name: Option<String>,
    stack_size: Option<usize>,
    priority: u8,
}

impl<'rt> TaskBuilder<'rt> {
    pub(crate) fn new(runtime: &'rt Runtime) -> Self {
        Self {
            runtime,
            name: None,
            stack_size: None,
            priority: 0,
        }
    }

    /// Names the task. The native thread is named after it.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Overrides the runtime's native stack size for this task. Zero keeps
    /// the runtime default.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = (bytes > 0).then_some(bytes);
        self
    }

    /// Records a priority. It has no effect on scheduling.
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Starts `work` on a new native thread and returns the task handle.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`SpawnFailed`](crate::error::ErrorKind::SpawnFailed)
    /// if the host refuses to create the thread. No handle is allocated in
    /// that case.
    pub fn spawn<F>(self, work: F) -> Result<TaskId>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let inner = Arc::clone(&self.runtime.inner);
        let config = &inner.config;
        let name = self.name.unwrap_or_else(|| "task".to_string());
        let stack_size = self.stack_size.unwrap_or(config.thread_stack_size);
        let thread_name = format!("{}-{}", config.thread_name_prefix, name);
        let timing = config.timing();

        let shared = inner
            .registry
            .insert_spawned(name, self.priority, |shared| {
                let cx = TaskContext::new(shared, timing);
                let thread_inner = Arc::clone(&inner);
                let mut builder = std::thread::Builder::new().name(thread_name);
                if stack_size > 0 {
                    builder = builder.stack_size(stack_size);
                }
                builder.spawn(move || run_task(&thread_inner, cx, work))
            })
            .map_err(|err| {
                warn!(error = %err, "task spawn failed");
                err
            })?;

        debug!(
            task_id = %shared.id,
            task_name = %shared.name,
            priority = shared.priority,
            "task created"
        );
        Ok(shared.id)
    }
}

fn run_task<F>(inner: &RuntimeInner, cx: TaskContext, work: F)
where
    F: FnOnce() -> Result<()>,
{
    let shared = Arc::clone(cx.shared());
    let guard = TaskContext::set_current(Some(cx));
    debug!(task_id = %shared.id, "task started");

    let exit = match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(())) => TaskExit::Completed,
        Ok(Err(err)) if err.is_cancelled() => {
            TaskExit::Cancelled(shared.token.reason().unwrap_or_default())
        }
        Ok(Err(err)) => {
            warn!(task_id = %shared.id, task_name = %shared.name, error = %err, "task failed");
            TaskExit::Failed(err)
        }
        Err(payload) => {
            let payload = PanicPayload::from_any(payload.as_ref());
            error!(task_id = %shared.id, task_name = %shared.name, %payload, "task panicked");
            TaskExit::Panicked(payload)
        }
    };
    debug!(task_id = %shared.id, exit = %exit, "task exited");
    drop(guard);
    finish(inner, &shared, exit);
}

/// Records the exit and removes the task's own record unless a deleter
/// already did. Runs after the thread's context is cleared.
fn finish(inner: &RuntimeInner, shared: &Arc<TaskShared>, exit: TaskExit) {
    debug_assert!(!crate::cx::is_managed(), "task context still bound at exit");
    shared.record_exit(exit);
    if inner.registry.remove(shared.id).is_some() {
        debug!(task_id = %shared.id, "task removed itself");
    }
}
