//! In-memory collaborators for unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::{Action, ConfigSource, Task};
use crate::error::{ConfigError, ExecutorError, ReportError};
use crate::executor::{ExecutionHandle, TaskExecutor};
use crate::reporter::{RunContext, StatusKind, StatusReporter};

/// One call observed by [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { handle: String, task: String },
    FetchLogs { handle: String },
    Release { handle: String },
}

/// Executor whose behavior is scripted per task name.
#[derive(Default)]
pub struct RecordingExecutor {
    logs: HashMap<String, String>,
    create_failures: HashMap<String, String>,
    log_failures: HashSet<String>,
    release_failures: HashSet<String>,
    tasks_by_handle: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logs(mut self, task: &str, logs: &str) -> Self {
        self.logs.insert(task.into(), logs.into());
        self
    }

    pub fn failing_create(mut self, task: &str, reason: &str) -> Self {
        self.create_failures.insert(task.into(), reason.into());
        self
    }

    pub fn failing_logs(mut self, task: &str) -> Self {
        self.log_failures.insert(task.into());
        self
    }

    pub fn failing_release(mut self, task: &str) -> Self {
        self.release_failures.insert(task.into());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|&c| pred(c)).count()
    }

    fn task_of(&self, handle: &ExecutionHandle) -> String {
        self.tasks_by_handle
            .lock()
            .unwrap()
            .get(handle.name())
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl TaskExecutor for RecordingExecutor {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn create(
        &self,
        handle: &ExecutionHandle,
        _action: &Action,
        task: &Task,
    ) -> Result<(), ExecutorError> {
        self.tasks_by_handle
            .lock()
            .unwrap()
            .insert(handle.name().into(), task.name.clone());
        self.calls.lock().unwrap().push(Call::Create {
            handle: handle.name().into(),
            task: task.name.clone(),
        });
        match self.create_failures.get(&task.name) {
            Some(reason) => Err(ExecutorError::Create {
                handle: handle.name().into(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn fetch_logs(&self, handle: &ExecutionHandle) -> Result<String, ExecutorError> {
        self.calls.lock().unwrap().push(Call::FetchLogs {
            handle: handle.name().into(),
        });
        let task = self.task_of(handle);
        if self.log_failures.contains(&task) {
            return Err(ExecutorError::Logs {
                handle: handle.name().into(),
                reason: "log stream closed".into(),
            });
        }
        Ok(self.logs.get(&task).cloned().unwrap_or_default())
    }

    async fn release(&self, handle: ExecutionHandle) -> Result<(), ExecutorError> {
        self.calls.lock().unwrap().push(Call::Release {
            handle: handle.name().into(),
        });
        if self.release_failures.contains(&self.task_of(&handle)) {
            return Err(ExecutorError::Release {
                handle: handle.name().into(),
                reason: "resource busy".into(),
            });
        }
        Ok(())
    }
}

/// Reporter that records every notification.
#[derive(Default)]
pub struct RecordingReporter {
    fail: bool,
    events: Mutex<Vec<(StatusKind, RunContext, Option<String>)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every report call records the notification and then errors.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn kinds(&self) -> Vec<StatusKind> {
        self.events.lock().unwrap().iter().map(|e| e.0).collect()
    }

    pub fn contexts(&self) -> Vec<RunContext> {
        self.events.lock().unwrap().iter().map(|e| e.1.clone()).collect()
    }

    /// Message of the last terminal notification, if any.
    pub fn terminal_message(&self) -> Option<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|e| e.2.clone())
    }

    fn record(
        &self,
        kind: StatusKind,
        ctx: &RunContext,
        message: Option<&str>,
    ) -> Result<(), ReportError> {
        self.events
            .lock()
            .unwrap()
            .push((kind, ctx.clone(), message.map(str::to_string)));
        if self.fail {
            return Err(ReportError::Io(std::io::Error::other("notification sink down")));
        }
        Ok(())
    }
}

#[async_trait]
impl StatusReporter for RecordingReporter {
    async fn report_started(&self, ctx: &RunContext) -> Result<(), ReportError> {
        self.record(StatusKind::Started, ctx, None)
    }

    async fn report_succeeded(&self, ctx: &RunContext, message: &str) -> Result<(), ReportError> {
        self.record(StatusKind::Succeeded, ctx, Some(message))
    }

    async fn report_failed(&self, ctx: &RunContext, message: &str) -> Result<(), ReportError> {
        self.record(StatusKind::Failed, ctx, Some(message))
    }
}

/// Config source serving a fixed document (or a fetch failure).
pub struct StaticConfigSource {
    content: Option<String>,
    fetches: AtomicUsize,
}

impl StaticConfigSource {
    pub fn new(content: &str) -> Self {
        Self {
            content: Some(content.into()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            content: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigSource for StaticConfigSource {
    fn location(&self) -> String {
        "memory://config.yaml".into()
    }

    async fn fetch(&self) -> Result<Vec<u8>, ConfigError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.content {
            Some(c) => Ok(c.clone().into_bytes()),
            None => Err(ConfigError::Fetch {
                location: self.location(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "resource not found"),
            }),
        }
    }
}
