use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Root settings for the jobtrigger service.
///
/// Deserialized once at startup from a JSON file and passed explicitly into
/// the executor, reporter and event handler constructors. Nothing in the
/// orchestration core reads process environment on its own.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServiceSettings {
    /// Name this service reports status under.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Path of the YAML action document, re-read for every event.
    #[serde(default = "default_actions_path")]
    pub actions_path: String,

    /// Prefix for execution names (`<prefix>-<event id>-<task #>`).
    #[serde(default = "default_job_prefix")]
    pub job_prefix: String,

    /// Task execution backend.
    #[serde(default)]
    pub executor: ExecutorSettings,

    /// Status notification backend.
    #[serde(default)]
    pub reporter: ReporterSettings,

    /// Event input sources (stdin, tcp).
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            actions_path: default_actions_path(),
            job_prefix: default_job_prefix(),
            executor: ExecutorSettings::default(),
            reporter: ReporterSettings::default(),
            sources: default_sources(),
        }
    }
}

fn default_service_name() -> String {
    "jobtrigger".to_string()
}

fn default_actions_path() -> String {
    "jobtrigger/config.yaml".to_string()
}

fn default_job_prefix() -> String {
    "jobtrigger".to_string()
}

fn default_sources() -> Vec<SourceConfig> {
    vec![SourceConfig::Stdin]
}

/// Execution backend selection.
/// Use `type` to select a variant:
/// - "container": run each task with a container CLI (docker/podman)
/// - "dry_run": log what would run, never touch a backend
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutorSettings {
    Container {
        /// Container CLI binary (default: "docker").
        #[serde(default = "default_runtime")]
        runtime: String,
        /// Host directory task `files` are resolved against.
        #[serde(default = "default_files_root")]
        files_root: String,
        /// Directory inside the container where task files are mounted.
        #[serde(default = "default_mount_path")]
        mount_path: String,
    },
    DryRun,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self::Container {
            runtime: default_runtime(),
            files_root: default_files_root(),
            mount_path: default_mount_path(),
        }
    }
}

fn default_runtime() -> String {
    "docker".to_string()
}

fn default_files_root() -> String {
    ".".to_string()
}

fn default_mount_path() -> String {
    "/keptn".to_string()
}

/// Status notification backend.
/// - "log": emit status through tracing
/// - "ndjson": write one JSON status event per line to stdout
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReporterSettings {
    #[default]
    Log,
    Ndjson,
}

/// Event source configuration.
/// - "stdin": read newline-delimited JSON events from standard input
/// - "tcp": accept connections and read newline-delimited JSON events
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    Stdin,
    Tcp {
        /// Bind address and port (e.g. "127.0.0.1:7070").
        bind: String,
    },
}
