//! Tracing configuration for the storage client
//!
//! Installs the global `tracing-subscriber` registry: an env-filter for level
//! control and a fmt layer whose lines read
//! `2025-01-15 10:30:45.123 INFO [file.rs:42] [target] message`.

use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Check if running in development environment
fn is_development() -> bool {
    cfg!(debug_assertions)
}

/// Build the default filter directives for tracing
///
/// ## Behavior / 行为
/// - **Development**: debug level for the pipelines and adapters
/// - **Production**: info level
/// - **HTTP stack**: hyper/reqwest stay at warn, they are noisy on URL sources
fn build_filter_directives(is_dev: bool) -> Vec<String> {
    let level = if is_dev { "debug" } else { "info" };
    vec![
        level.to_string(),
        format!("ss_app={level}"),
        format!("ss_infra={level}"),
        "hyper=warn".to_string(),
        "reqwest=warn".to_string(),
    ]
}

/// Initialize the tracing subscriber
///
/// - Respects `RUST_LOG`; falls back to [`build_filter_directives`]
/// - Emits ChronoUtc timestamps, file/line and target
///
/// Call once at startup, before the first upload or download:
///
/// ```ignore
/// sirius_storage::bootstrap::tracing::init_tracing_subscriber()?;
/// ```
///
/// ## Errors / 错误
///
/// Returns `Err` if a global subscriber is already registered.
pub fn init_tracing_subscriber() -> anyhow::Result<()> {
    let filter_directives = build_filter_directives(is_development());
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives.join(",")));

    let stdout_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(
            "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        ))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)));

    registry().with(env_filter).with(stdout_layer).try_init()?;
    Ok(())
}
