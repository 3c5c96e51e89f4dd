/*!
Event sources (ingestion layer).

Each source produces raw JSON envelopes and pushes them into a shared
channel; decoding the envelope and handling the event happen downstream.

- `stdin_source.rs` -> `StdinSource` (newline-delimited JSON from standard input)
- `tcp.rs`          -> `TcpSource`   (newline-delimited JSON over TCP connections)

Every source:
- Pushes events via `Sender<Value>` while respecting backpressure (`send().await`)
- Logs malformed input and keeps going (never panicking inside tasks)
- Ends cleanly when the channel closes
*/

use serde_json::Value;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc::Sender,
    task::JoinHandle,
};
use tracing::{error, info, trace, warn};

use crate::config::SourceConfig;

pub mod stdin_source;
pub mod tcp;

pub use stdin_source::StdinSource;
pub use tcp::TcpSource;

/// Trait implemented by all event sources.
pub trait EventSource: Send + Sync {
    /// Static human-readable identifier (used in logs).
    fn name(&self) -> &'static str;

    /// Start the source in the background.
    fn start(&self, sender: Sender<Value>) -> JoinHandle<()>;
}

/// Construct all configured sources, in configuration order.
pub fn build_sources(configs: &[SourceConfig]) -> Vec<Box<dyn EventSource>> {
    configs
        .iter()
        .map(|sc| -> Box<dyn EventSource> {
            match sc {
                SourceConfig::Stdin => Box::new(StdinSource::new()),
                SourceConfig::Tcp { bind } => Box::new(TcpSource::new(bind.clone())),
            }
        })
        .collect()
}

/// Spawn every source, returning their `JoinHandle`s.
pub fn spawn_all_sources(
    sources: &[Box<dyn EventSource>],
    sender: Sender<Value>,
) -> Vec<JoinHandle<()>> {
    sources
        .iter()
        .map(|src| {
            info!(
                target: "jobtrigger::sources",
                source = %src.name(),
                "Starting source task"
            );
            src.start(sender.clone())
        })
        .collect()
}

/// Read newline-delimited JSON from `reader` until EOF, a read error, or the
/// channel closing. Blank lines are skipped; malformed lines are logged and
/// skipped. Returns the number of events forwarded.
pub(crate) async fn forward_ndjson<R>(reader: R, sender: &Sender<Value>, origin: &str) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                trace!(target: "jobtrigger::sources", %origin, "EOF");
                break;
            }
            Err(e) => {
                warn!(
                    target: "jobtrigger::sources",
                    %origin, error = %e,
                    "Read error; closing input"
                );
                break;
            }
        };

        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => {
                if let Err(e) = sender.send(value).await {
                    error!(
                        target: "jobtrigger::sources",
                        %origin, error = %e,
                        "Channel closed while forwarding event"
                    );
                    break;
                }
                forwarded += 1;
            }
            Err(e) => {
                warn!(
                    target: "jobtrigger::sources",
                    %origin, error = %e, line = raw,
                    "Failed to parse JSON line"
                );
            }
        }
    }

    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::BufReader;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_forward_ndjson_skips_blank_and_malformed() {
        let input = b"{\"type\":\"a\"}\n\n  \nnot json\n{\"type\":\"b\"}\n";
        let (tx, mut rx) = mpsc::channel(8);
        let n = forward_ndjson(BufReader::new(&input[..]), &tx, "test").await;
        assert_eq!(n, 2);
        assert_eq!(rx.recv().await.unwrap(), json!({"type": "a"}));
        assert_eq!(rx.recv().await.unwrap(), json!({"type": "b"}));
    }

    #[tokio::test]
    async fn test_forward_ndjson_stops_when_channel_closed() {
        let input = b"{\"n\":1}\n{\"n\":2}\n";
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let n = forward_ndjson(BufReader::new(&input[..]), &tx, "test").await;
        assert_eq!(n, 0);
    }

    #[test]
    fn test_build_sources_preserves_order() {
        let sources = build_sources(&[
            SourceConfig::Tcp {
                bind: "127.0.0.1:0".into(),
            },
            SourceConfig::Stdin,
        ]);
        let names: Vec<_> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["tcp", "stdin"]);
    }
}
