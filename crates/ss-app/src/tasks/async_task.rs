//! One-shot task handle with optional completion callbacks.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ss_core::error::StorageError;
use tracing::error;

type SuccessCallback<T> = Box<dyn FnOnce(&T) + Send>;
type FailureCallback = Box<dyn FnOnce(&StorageError) + Send>;

/// Callbacks run once the task completes. At most one of them ever fires.
pub struct AsyncCallbacks<T> {
    on_success: Option<SuccessCallback<T>>,
    on_failure: Option<FailureCallback>,
}

impl<T> AsyncCallbacks<T> {
    pub fn new() -> Self {
        Self {
            on_success: None,
            on_failure: None,
        }
    }

    pub fn on_success(mut self, callback: impl FnOnce(&T) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_failure(mut self, callback: impl FnOnce(&StorageError) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(callback));
        self
    }
}

impl<T> Default for AsyncCallbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct TaskState<T> {
    completed: bool,
    outcome: Option<Result<T, StorageError>>,
}

struct Shared<T> {
    state: Mutex<TaskState<T>>,
    done: AtomicBool,
    completed: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, TaskState<T>> {
        // Only plain field writes happen under the lock, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a work item scheduled on a background worker.
///
/// The task moves from pending to done exactly once. [`AsyncTask::wait`] hands the
/// outcome to the caller; a timeout only bounds the wait, the work keeps running.
pub struct AsyncTask<T> {
    shared: Arc<Shared<T>>,
}

impl<T> AsyncTask<T> {
    /// Creates a pending task and the completer that will finish it.
    pub(crate) fn pending(callbacks: AsyncCallbacks<T>) -> (Self, Completer<T>) {
        let shared = Arc::new(Shared {
            state: Mutex::new(TaskState {
                completed: false,
                outcome: None,
            }),
            done: AtomicBool::new(false),
            completed: Condvar::new(),
        });
        let completer = Completer {
            shared: shared.clone(),
            callbacks: Some(callbacks),
        };
        (Self { shared }, completer)
    }

    /// Non-blocking poll of the completion flag.
    pub fn is_done(&self) -> bool {
        self.shared.done.load(Ordering::Acquire)
    }

    /// Blocks until the task completes, or until `timeout` elapses.
    ///
    /// Fails with [`StorageError::TimedOut`] when the timeout elapses first, and
    /// with a validation error when the outcome was already taken by an earlier wait.
    pub fn wait(&mut self, timeout: Option<Duration>) -> Result<T, StorageError> {
        let guard = self.shared.lock();
        let mut state = match timeout {
            Some(timeout) => {
                let (state, result) = self
                    .shared
                    .completed
                    .wait_timeout_while(guard, timeout, |state| !state.completed)
                    .unwrap_or_else(PoisonError::into_inner);
                if result.timed_out() && !state.completed {
                    return Err(StorageError::TimedOut(timeout));
                }
                state
            }
            None => self
                .shared
                .completed
                .wait_while(guard, |state| !state.completed)
                .unwrap_or_else(PoisonError::into_inner),
        };

        state.outcome.take().unwrap_or_else(|| {
            Err(StorageError::Validation(
                "task outcome was already taken".to_string(),
            ))
        })
    }
}

/// Write side of an [`AsyncTask`]. Completing runs the matching callback without
/// holding the task lock, then publishes the outcome and the done flag and wakes
/// waiters.
///
/// Dropping a completer that never completed fails the task, so a work item
/// discarded by a shutting-down runtime cannot leave waiters blocked forever.
pub(crate) struct Completer<T> {
    shared: Arc<Shared<T>>,
    callbacks: Option<AsyncCallbacks<T>>,
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, outcome: Result<T, StorageError>) {
        self.publish(outcome);
    }

    fn publish(&mut self, outcome: Result<T, StorageError>) {
        let Some(callbacks) = self.callbacks.take() else {
            return;
        };

        let callback_result = panic::catch_unwind(AssertUnwindSafe(|| match &outcome {
            Ok(value) => {
                if let Some(on_success) = callbacks.on_success {
                    on_success(value);
                }
            }
            Err(err) => {
                if let Some(on_failure) = callbacks.on_failure {
                    on_failure(err);
                }
            }
        }));

        {
            let mut state = self.shared.lock();
            state.completed = true;
            state.outcome = Some(outcome);
            self.shared.done.store(true, Ordering::Release);
        }
        self.shared.completed.notify_all();

        if callback_result.is_err() {
            error!("Async task completion callback panicked");
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if self.callbacks.is_some() {
            self.publish(Err(StorageError::Io(
                "work item was dropped before it completed".to_string(),
            )));
        }
    }
}
