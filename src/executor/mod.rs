#![allow(clippy::missing_errors_doc)]

/*!
Task execution backends.

The orchestrator drives one execution per task through the `TaskExecutor`
trait:
- `create`: start the execution and wait for the backend to accept/finish it
- `fetch_logs`: collect whatever output the execution produced
- `release`: tear the backend resource down (consumes the handle)

The orchestrator mints the `ExecutionHandle` itself, so a handle exists (and
is released) even when `create` fails halfway through.

Backends:
- `ContainerExecutor`: docker/podman CLI through `tokio::process`
- `DryRunExecutor`: logs what would run and never touches a backend
*/

use async_trait::async_trait;
use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::{Action, ExecutorSettings, Task};
use crate::error::ExecutorError;

pub mod container;
pub mod dry_run;

pub use container::ContainerExecutor;
pub use dry_run::DryRunExecutor;

/// Maximum length of an execution name (DNS label limit).
const MAX_NAME_LEN: usize = 63;
/// Room kept free in a run name for the `-<task number>` suffix.
const TASK_SUFFIX_LEN: usize = 6;

/// Name of one task execution on the backend.
///
/// Not `Clone`: the orchestrator owns it exclusively and gives it up to
/// `TaskExecutor::release`.
#[derive(Debug, PartialEq, Eq)]
pub struct ExecutionHandle {
    name: String,
}

impl ExecutionHandle {
    /// Build the handle for task `index` (0-based) of a run.
    pub fn for_task(run_name: &str, index: usize) -> Self {
        let suffix = format!("-{}", index + 1);
        let run = sanitize_name(run_name);
        let room = MAX_NAME_LEN.saturating_sub(suffix.len());
        // Shorten from the front: the end of a run name carries its run id.
        let run = run[run.len().saturating_sub(room)..].trim_start_matches('-');
        Self {
            name: format!("{run}{suffix}"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Fresh id for one run.
///
/// A random per-process salt followed by a sequence number: ids never repeat
/// within a process and are unlikely to repeat across restarts.
pub fn new_run_id() -> String {
    static SALT: OnceLock<u32> = OnceLock::new();
    static SEQ: AtomicU64 = AtomicU64::new(1);
    let salt = *SALT.get_or_init(rand::random::<u32>);
    format!("{:08x}{:x}", salt, SEQ.fetch_add(1, Ordering::Relaxed))
}

/// Name shared by every execution of one run: `<prefix>-<event id>-<run id>`.
///
/// The run id is kept whole and `<prefix>-<event id>` is cut to fit, so
/// distinct run ids give distinct names whatever the event id looks like.
pub fn run_name(prefix: &str, event_id: &str, run_id: &str) -> String {
    let limit = MAX_NAME_LEN - TASK_SUFFIX_LEN;
    let id = sanitize_name(run_id);
    let id = id[id.len().saturating_sub(limit)..].trim_start_matches('-');
    let head = sanitize_name(&format!("{prefix}-{event_id}"));
    let room = limit.saturating_sub(id.len() + 1);
    let head = head[..head.len().min(room)].trim_end_matches('-');
    match (head.is_empty(), id.is_empty()) {
        (_, true) => head.to_string(),
        (true, false) => id.to_string(),
        (false, false) => format!("{head}-{id}"),
    }
}

/// Lowercase, keep `[a-z0-9-]`, collapse everything else into `-` and trim
/// dashes at both ends.
fn sanitize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Backend able to run one task execution at a time per handle.
///
/// Implementations must be safe to share between independent runs.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Static human-readable identifier (used in logs).
    fn name(&self) -> &'static str;

    /// Start the execution of `task` under `handle`.
    async fn create(
        &self,
        handle: &ExecutionHandle,
        action: &Action,
        task: &Task,
    ) -> Result<(), ExecutorError>;

    /// Output currently available for the execution.
    async fn fetch_logs(&self, handle: &ExecutionHandle) -> Result<String, ExecutorError>;

    /// Tear down the backend resource. Called exactly once per handle.
    async fn release(&self, handle: ExecutionHandle) -> Result<(), ExecutorError>;
}

/// Construct the executor selected in the settings.
pub fn build_executor(settings: &ExecutorSettings) -> Box<dyn TaskExecutor> {
    match settings {
        ExecutorSettings::Container {
            runtime,
            files_root,
            mount_path,
        } => Box::new(ContainerExecutor::new(
            runtime.clone(),
            files_root.into(),
            mount_path.clone(),
        )),
        ExecutorSettings::DryRun => Box::new(DryRunExecutor::new()),
    }
}
