//! Sequential task runner for one matched action.
//!
//! State machine: `NotStarted -> Running(i) -> Succeeded | Failed`.
//!
//! For every task, in order: create the execution, fetch its logs (even if
//! creation failed), release it, append the logs. Release always happens
//! before the next task starts, so at most one execution handle is alive per
//! run. The first creation failure ends the run with a `failed` report;
//! earlier tasks are not rolled back and nothing is retried.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{Action, Task};
use crate::error::ExecutorError;
use crate::executor::{ExecutionHandle, TaskExecutor, run_name};
use crate::reporter::{RunContext, StatusReporter};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    /// Executing the task at this index.
    Running(usize),
    Succeeded,
    Failed,
}

/// Append-only per-task logs of one run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogBuffer {
    segments: Vec<String>,
}

impl LogBuffer {
    pub fn push(&mut self, logs: String) {
        self.segments.push(logs);
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn concat(&self) -> String {
        self.segments.concat()
    }
}

/// Transient state of one action run.
#[derive(Debug)]
struct ActionRunState {
    state: RunState,
    logs: LogBuffer,
}

/// What a finished run looks like from the outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub action: String,
    /// Always `Succeeded` or `Failed`.
    pub state: RunState,
    pub logs: LogBuffer,
    /// Number of tasks whose creation was attempted.
    pub attempted: usize,
    /// Message sent with the terminal notification.
    pub message: String,
}

/// Outcome of one create/logs/release cycle.
struct TaskStep {
    execution: String,
    created: Result<(), ExecutorError>,
    logs: String,
}

/// Drives the tasks of a single action. Build one per run.
pub struct ActionOrchestrator {
    executor: Arc<dyn TaskExecutor>,
    reporter: Arc<dyn StatusReporter>,
    job_prefix: String,
}

impl ActionOrchestrator {
    pub fn new(
        executor: Arc<dyn TaskExecutor>,
        reporter: Arc<dyn StatusReporter>,
        job_prefix: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            reporter,
            job_prefix: job_prefix.into(),
        }
    }

    /// Run every task of `action` and emit exactly one terminal status.
    pub async fn run(&self, action: &Action, ctx: &RunContext) -> RunReport {
        let run = run_name(&self.job_prefix, &ctx.event_id, &ctx.run_id);
        let mut state = ActionRunState {
            state: RunState::NotStarted,
            logs: LogBuffer::default(),
        };

        if let Err(e) = self.reporter.report_started(ctx).await {
            warn!(
                target: "jobtrigger::orchestrator",
                action = %action.name, error = %e,
                "Error while sending started status; continuing"
            );
        }

        let total = action.tasks.len();
        for (index, task) in action.tasks.iter().enumerate() {
            state.state = RunState::Running(index);
            info!(
                target: "jobtrigger::orchestrator",
                action = %action.name,
                "Starting task {}/{}: '{}' ...", index + 1, total, task.name
            );

            let step = self
                .run_task(ExecutionHandle::for_task(&run, index), action, task)
                .await;
            state.logs.push(step.logs);

            if let Err(err) = step.created {
                state.state = RunState::Failed;
                let message = format!(
                    "Job {} failed: {}\n\nLogs:\n{}",
                    step.execution,
                    err,
                    state.logs.concat()
                );
                if let Err(e) = self.reporter.report_failed(ctx, &message).await {
                    warn!(
                        target: "jobtrigger::orchestrator",
                        action = %action.name, error = %e,
                        "Error while sending failed status"
                    );
                }
                return RunReport {
                    action: action.name.clone(),
                    state: state.state,
                    logs: state.logs,
                    attempted: index + 1,
                    message,
                };
            }
        }

        state.state = RunState::Succeeded;
        info!(
            target: "jobtrigger::orchestrator",
            action = %action.name, event_id = %ctx.event_id, tasks = total,
            "Successfully finished processing of event"
        );
        let message = format!(
            "Job {} finished successfully!\n\nLogs:\n{}",
            run,
            state.logs.concat()
        );
        if let Err(e) = self.reporter.report_succeeded(ctx, &message).await {
            warn!(
                target: "jobtrigger::orchestrator",
                action = %action.name, error = %e,
                "Error while sending succeeded status"
            );
        }
        RunReport {
            action: action.name.clone(),
            state: state.state,
            logs: state.logs,
            attempted: total,
            message,
        }
    }

    /// Create, collect logs, release. The handle is consumed by `release`
    /// on every path before this returns.
    async fn run_task(&self, handle: ExecutionHandle, action: &Action, task: &Task) -> TaskStep {
        let created = self.executor.create(&handle, action, task).await;
        if let Err(e) = &created {
            warn!(
                target: "jobtrigger::orchestrator",
                execution = %handle, task = %task.name, error = %e,
                "Error while creating execution"
            );
        }

        let logs = match self.executor.fetch_logs(&handle).await {
            Ok(logs) => logs,
            Err(e) => {
                debug!(
                    target: "jobtrigger::orchestrator",
                    execution = %handle, error = %e,
                    "Error while retrieving logs; using empty log"
                );
                String::new()
            }
        };

        let execution = handle.name().to_string();
        if let Err(e) = self.executor.release(handle).await {
            warn!(
                target: "jobtrigger::orchestrator",
                %execution, error = %e,
                "Error while releasing execution"
            );
        }

        TaskStep {
            execution,
            created,
            logs,
        }
    }
}
