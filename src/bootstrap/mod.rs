//! Bootstrap: tracing, configuration loading and client wiring.

pub mod client;
pub mod config;
pub mod tracing;

pub use client::{build_client, StorageClient};
pub use config::load_config;
pub use self::tracing::init_tracing_subscriber;
