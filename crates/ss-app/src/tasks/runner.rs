use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use ss_core::error::StorageError;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, info_span};

use super::async_task::{AsyncCallbacks, AsyncTask};

const WORKER_THREAD_NAME: &str = "sirius-storage-worker";

/// Schedules pipeline invocations on tokio's blocking pool.
///
/// Either owns a dedicated multi-thread runtime or borrows the handle of one the
/// caller already runs. Tasks spawned on an owned runtime must finish before the
/// runner is dropped; tasks that never started fail instead of hanging.
pub struct TaskRunner {
    handle: Handle,
    runtime: Option<Runtime>,
}

impl TaskRunner {
    /// Builds a dedicated runtime. `worker_threads == 0` keeps tokio's default.
    pub fn new(worker_threads: usize) -> Result<Self, StorageError> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(WORKER_THREAD_NAME);
        if worker_threads > 0 {
            builder.worker_threads(worker_threads);
        }
        let runtime = builder
            .build()
            .map_err(|e| StorageError::Io(format!("failed to start task runtime: {e}")))?;

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    /// Runs tasks on a runtime owned by the caller.
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            runtime: None,
        }
    }

    /// Schedules `work` immediately and returns without blocking.
    ///
    /// A panic inside `work` is reported as a task failure.
    pub fn spawn<T, F>(&self, work: F, callbacks: AsyncCallbacks<T>) -> AsyncTask<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    {
        self.spawn_mapped(work, std::convert::identity, callbacks)
    }

    /// Like [`spawn`](Self::spawn), with every failure passed through `map_err`
    /// before callbacks fire, panics included.
    pub(crate) fn spawn_mapped<T, F>(
        &self,
        work: F,
        map_err: fn(StorageError) -> StorageError,
        callbacks: AsyncCallbacks<T>,
    ) -> AsyncTask<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    {
        let (task, completer) = AsyncTask::pending(callbacks);
        let parent = tracing::Span::current();

        self.handle.spawn_blocking(move || {
            let span = info_span!(parent: &parent, "app.task.run");
            let _enter = span.enter();

            let outcome = panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
                Err(StorageError::Io(format!(
                    "work item panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });
            let outcome = outcome.map_err(map_err);
            debug!(success = outcome.is_ok(), "Async task finished");
            completer.complete(outcome);
        });

        task
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which tokio forbids inside async contexts.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
