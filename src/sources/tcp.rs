//! TCP event source.
//!
//! Listens on `bind` and treats every accepted connection as a stream of
//! newline-delimited JSON envelopes. Each connection is served by its own task;
//! a failed accept is logged and retried after a short pause.

use serde_json::Value;
use std::time::Duration;
use tokio::{io::BufReader, net::TcpListener, sync::mpsc::Sender, task::JoinHandle};
use tracing::{debug, error, info, warn};

use super::{EventSource, forward_ndjson};

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct TcpSource {
    bind: String,
}

impl TcpSource {
    pub fn new(bind: String) -> Self {
        Self { bind }
    }
}

/// Accept connections forever (until the channel closes).
async fn serve(listener: TcpListener, sender: Sender<Value>) {
    loop {
        if sender.is_closed() {
            break;
        }
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(target: "jobtrigger::sources", error = %e, "Failed to accept TCP connection");
                // EMFILE and the like persist across retries.
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        debug!(target: "jobtrigger::sources", %peer, "Accepted TCP connection");

        let sender = sender.clone();
        tokio::spawn(async move {
            let origin = peer.to_string();
            let forwarded = forward_ndjson(BufReader::new(stream), &sender, &origin).await;
            debug!(target: "jobtrigger::sources", %peer, forwarded, "TCP connection closed");
        });
    }
}

impl EventSource for TcpSource {
    fn name(&self) -> &'static str {
        "tcp"
    }

    fn start(&self, sender: Sender<Value>) -> JoinHandle<()> {
        let bind = self.bind.clone();
        tokio::spawn(async move {
            let listener = match TcpListener::bind(&bind).await {
                Ok(l) => l,
                Err(e) => {
                    error!(target: "jobtrigger::sources", %bind, error = %e, "Failed to bind TCP source");
                    return;
                }
            };
            info!(target: "jobtrigger::sources", %bind, "TcpSource listening");
            serve(listener, sender).await;
            info!(target: "jobtrigger::sources", %bind, "TcpSource task ended");
        })
    }
}
