//! Status notification backends.
//!
//! An action run emits at most one `started` and exactly one terminal
//! (`succeeded` / `failed`) notification through a [`StatusReporter`].
//! Reporting failures are the caller's to log; they never stop a run.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ReporterSettings;
use crate::error::ReportError;

pub mod log;
pub mod ndjson;

pub use self::log::TracingReporter;
pub use self::ndjson::NdjsonReporter;

/// Identifies the event and action a status notification belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub event_id: String,
    /// Unique per run; two deliveries of one event get different ids.
    pub run_id: String,
    pub event_type: String,
    pub source: Option<String>,
    pub service_name: String,
    pub action_name: String,
}

impl RunContext {
    /// Event type of the `started` notification.
    pub fn started_type(&self) -> String {
        derive_event_type(&self.event_type, "started")
    }

    /// Event type of the terminal notification.
    pub fn finished_type(&self) -> String {
        derive_event_type(&self.event_type, "finished")
    }
}

/// `sh.keptn.event.test.triggered` -> `sh.keptn.event.test.<phase>`;
/// any other type gets `.<phase>` appended.
fn derive_event_type(event_type: &str, phase: &str) -> String {
    match event_type.strip_suffix(".triggered") {
        Some(stem) => format!("{stem}.{phase}"),
        None => format!("{event_type}.{phase}"),
    }
}

/// The three status kinds a run can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Started,
    Succeeded,
    Failed,
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Started => "started",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        })
    }
}

/// Emits run status notifications.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn report_started(&self, ctx: &RunContext) -> Result<(), ReportError>;

    async fn report_succeeded(&self, ctx: &RunContext, message: &str) -> Result<(), ReportError>;

    async fn report_failed(&self, ctx: &RunContext, message: &str) -> Result<(), ReportError>;
}

/// Construct the reporter selected in the settings.
pub fn build_reporter(settings: ReporterSettings) -> Box<dyn StatusReporter> {
    match settings {
        ReporterSettings::Log => Box::new(TracingReporter),
        ReporterSettings::Ndjson => Box::new(NdjsonReporter::stdout()),
    }
}
