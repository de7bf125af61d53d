//! Async boundary: pipelines stay synchronous and are scheduled here.

mod async_task;
mod runner;

pub use async_task::{AsyncCallbacks, AsyncTask};
pub use runner::TaskRunner;
