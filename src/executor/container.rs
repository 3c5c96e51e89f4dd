//! Container CLI executor.
//!
//! Runs every task as a detached container through a docker-compatible CLI
//! (`docker`, `podman`):
//! - `create`: `run -d --name <handle> -v <file mounts> <image> sh -c <cmd>`,
//!   then `wait <handle>`; a non-zero exit status is a creation error.
//! - `fetch_logs`: `logs <handle>` (stdout followed by stderr).
//! - `release`: `rm -f <handle>`.
//!
//! Task `files` are resolved against `files_root` on the host and bind-mounted
//! read-only below `mount_path` inside the container. A file that climbs out
//! of `files_root` (`..`) or contains `:` (the volume separator) fails the
//! task before the CLI is invoked.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, trace};

use super::{ExecutionHandle, TaskExecutor};
use crate::config::{Action, Task};
use crate::error::ExecutorError;

#[derive(Debug, Clone)]
pub struct ContainerExecutor {
    runtime: String,
    files_root: PathBuf,
    mount_path: String,
}

impl ContainerExecutor {
    pub fn new(runtime: String, files_root: PathBuf, mount_path: String) -> Self {
        Self {
            runtime,
            files_root,
            mount_path,
        }
    }

    /// Arguments for the detached `run` invocation.
    fn run_args(
        &self,
        handle: &ExecutionHandle,
        action: &Action,
        task: &Task,
    ) -> Result<Vec<String>, ExecutorError> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            handle.name().to_string(),
            "--label".to_string(),
            format!("jobtrigger.action={}", action.name),
            "--label".to_string(),
            format!("jobtrigger.task={}", task.name),
        ];
        let mount_root = self.mount_path.trim_end_matches('/');
        for file in &task.files {
            let rel = file.trim_start_matches('/');
            check_mountable(rel).map_err(|reason| ExecutorError::Create {
                handle: handle.name().to_string(),
                reason: format!("task '{}': {}", task.name, reason),
            })?;
            args.push("-v".to_string());
            args.push(format!(
                "{}:{}/{}:ro",
                self.files_root.join(rel).display(),
                mount_root,
                rel
            ));
        }
        args.push(task.image.clone());
        args.push("sh".to_string());
        args.push("-c".to_string());
        args.push(task.command.clone());
        Ok(args)
    }

    async fn cli(&self, args: &[String]) -> Result<Output, ExecutorError> {
        trace!(target: "jobtrigger::executor", runtime = %self.runtime, ?args, "Invoking container CLI");
        let output = Command::new(&self.runtime)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(output)
    }
}

/// A task file must stay below `files_root` and fit the `-v src:dst:ro` syntax.
fn check_mountable(rel: &str) -> Result<(), String> {
    if rel.is_empty() {
        return Err("empty file path".to_string());
    }
    if rel.contains(':') {
        return Err(format!("file '{rel}' contains ':'"));
    }
    if Path::new(rel)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(format!("file '{rel}' escapes the files root"));
    }
    Ok(())
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[async_trait]
impl TaskExecutor for ContainerExecutor {
    fn name(&self) -> &'static str {
        "container"
    }

    async fn create(
        &self,
        handle: &ExecutionHandle,
        action: &Action,
        task: &Task,
    ) -> Result<(), ExecutorError> {
        let create_err = |reason: String| ExecutorError::Create {
            handle: handle.name().to_string(),
            reason,
        };

        let started = self.cli(&self.run_args(handle, action, task)?).await?;
        if !started.status.success() {
            return Err(create_err(stderr_text(&started)));
        }
        debug!(
            target: "jobtrigger::executor",
            %handle, image = %task.image,
            "Container started; waiting for completion"
        );

        let waited = self.cli(&["wait".to_string(), handle.name().to_string()]).await?;
        if !waited.status.success() {
            return Err(create_err(stderr_text(&waited)));
        }
        let code = String::from_utf8_lossy(&waited.stdout).trim().to_string();
        if code != "0" {
            return Err(create_err(format!("task '{}' exited with code {}", task.name, code)));
        }
        Ok(())
    }

    async fn fetch_logs(&self, handle: &ExecutionHandle) -> Result<String, ExecutorError> {
        let output = self
            .cli(&["logs".to_string(), handle.name().to_string()])
            .await?;
        if !output.status.success() {
            return Err(ExecutorError::Logs {
                handle: handle.name().to_string(),
                reason: stderr_text(&output),
            });
        }
        let mut logs = String::from_utf8_lossy(&output.stdout).into_owned();
        logs.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(logs)
    }

    async fn release(&self, handle: ExecutionHandle) -> Result<(), ExecutorError> {
        let output = self
            .cli(&["rm".to_string(), "-f".to_string(), handle.name().to_string()])
            .await?;
        if !output.status.success() {
            return Err(ExecutorError::Release {
                handle: handle.name().to_string(),
                reason: stderr_text(&output),
            });
        }
        Ok(())
    }
}
