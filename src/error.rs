//! Error types for the orchestration core.
//!
//! Only [`ConfigError`] ever escapes the top-level event handler. Executor and
//! reporter failures are absorbed by the orchestrator and turned into status
//! reports or diagnostics.

/// Failure to obtain a usable action configuration for an event.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to fetch action config from {location}: {source}")]
    Fetch {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse action config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Errors raised by a task execution backend.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Failed to create execution {handle}: {reason}")]
    Create { handle: String, reason: String },
    #[error("Failed to fetch logs of {handle}: {reason}")]
    Logs { handle: String, reason: String },
    #[error("Failed to release {handle}: {reason}")]
    Release { handle: String, reason: String },
    #[error("Backend I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while emitting a status notification.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to serialize status event: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write status event: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while decoding an incoming event envelope.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Event is not a JSON object")]
    NotAnObject,
    #[error("Malformed event envelope: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Event field '{0}' must not be empty")]
    EmptyField(&'static str),
}
