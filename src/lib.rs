#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! jobtrigger: an event-triggered task orchestrator.
//!
//! An incoming event (type + JSON payload) is matched against a YAML action
//! document; the first matching action's tasks run one after another on an
//! execution backend, and a single started/succeeded/failed status is reported.
//!
//! Modules:
//! - `config`: Action document model and source, service settings and loader.
//! - `matcher`: Picks the action an event activates.
//! - `orchestrator`: Runs an action's tasks with fail-fast semantics.
//! - `executor`: Execution backends (container CLI, dry-run).
//! - `reporter`: Status backends (tracing, NDJSON).
//! - `handler`: Ties config, matcher and orchestrator together per event.
//! - `sources`: Event ingestion (stdin, TCP).
//!
//! Use `jobtrigger::prelude::*` to bring commonly used items into scope quickly.

pub mod config;
pub mod error;
pub mod event;
pub mod executor;
pub mod handler;
pub mod matcher;
pub mod orchestrator;
pub mod reporter;
pub mod sources;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Parse a level name (trace|debug|info|warn|error).
pub fn parse_level(s: &str) -> Option<tracing::Level> {
    use tracing::Level;
    match s.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging).
/// - `level` wins when given (e.g. from `--log-level`).
/// - Otherwise honors the `RUST_LOG` environment variable as a simple level.
/// - Falls back to `info`.
///
/// Logs go to stderr so stdout stays free for NDJSON status output.
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::fmt;

    let level = level
        .and_then(parse_level)
        .or_else(|| std::env::var("RUST_LOG").ok().as_deref().and_then(parse_level))
        .unwrap_or(tracing::Level::INFO);

    // Ignore the error if the global subscriber was already set.
    let _ = fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A convenient set of exports for most consumers.
pub mod prelude {
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};

    pub use serde::{Deserialize, Serialize};

    pub use tracing::{debug, error, info, instrument, trace, warn};

    pub use crate as jobtrigger;
    pub use crate::config::{Action, ActionConfig, ConfigSource, ServiceSettings, Task};
    pub use crate::event::IncomingEvent;
    pub use crate::executor::{ExecutionHandle, TaskExecutor};
    pub use crate::handler::{EventHandler, HandleOutcome};
    pub use crate::orchestrator::{ActionOrchestrator, RunReport, RunState};
    pub use crate::reporter::{RunContext, StatusReporter};
}
