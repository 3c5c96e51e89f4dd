//! Stdin event source.
//!
//! Reads newline-delimited JSON envelopes from standard input, e.g.:
//!     echo '{"id":"1","type":"test.triggered","data":{}}' | jobtrigger --settings jobtrigger.json
//!
//! Malformed lines are logged and ignored. EOF or a closed channel ends the task.

use serde_json::Value;
use tokio::{
    io::{self, BufReader},
    sync::mpsc::Sender,
    task::JoinHandle,
};
use tracing::info;

use super::{EventSource, forward_ndjson};

/// Source that reads newline-delimited JSON events from stdin.
#[derive(Debug, Clone, Default)]
pub struct StdinSource;

impl StdinSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EventSource for StdinSource {
    fn name(&self) -> &'static str {
        "stdin"
    }

    fn start(&self, sender: Sender<Value>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(target: "jobtrigger::sources", "StdinSource task started (reading lines)");
            let reader = BufReader::new(io::stdin());
            let forwarded = forward_ndjson(reader, &sender, "stdin").await;
            info!(target: "jobtrigger::sources", forwarded, "StdinSource task ended");
        })
    }
}
