use async_trait::async_trait;
use tracing::info;

use super::{ExecutionHandle, TaskExecutor};
use crate::config::{Action, Task};
use crate::error::ExecutorError;

/// Executor that only logs. Every task "succeeds" and reports one log line.
#[derive(Debug, Clone, Default)]
pub struct DryRunExecutor;

impl DryRunExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TaskExecutor for DryRunExecutor {
    fn name(&self) -> &'static str {
        "dry_run"
    }

    async fn create(
        &self,
        handle: &ExecutionHandle,
        action: &Action,
        task: &Task,
    ) -> Result<(), ExecutorError> {
        info!(
            target: "jobtrigger::executor",
            %handle, action = %action.name, task = %task.name,
            image = %task.image, cmd = %task.command, files = ?task.files,
            "DRY-RUN create"
        );
        Ok(())
    }

    async fn fetch_logs(&self, handle: &ExecutionHandle) -> Result<String, ExecutorError> {
        Ok(format!("[dry-run] {handle} completed\n"))
    }

    async fn release(&self, handle: ExecutionHandle) -> Result<(), ExecutorError> {
        info!(target: "jobtrigger::executor", %handle, "DRY-RUN release");
        Ok(())
    }
}
