//! Newline-delimited JSON status reporter.
//!
//! Each notification becomes one line:
//!
//! ```json
//! {"type":"sh.keptn.event.test.finished","triggeredid":"e1","source":"jobtrigger",
//!  "data":{"action":"deploy-job","origin":"shipyard-controller","status":"failed",
//!          "result":"fail","message":"..."}}
//! ```
//!
//! Writes are serialized through a mutex so concurrent runs never interleave
//! partial lines.

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::{RunContext, StatusKind, StatusReporter};
use crate::error::ReportError;

#[derive(Debug, Serialize)]
struct StatusEvent<'a> {
    #[serde(rename = "type")]
    event_type: String,
    triggeredid: &'a str,
    source: &'a str,
    data: StatusData<'a>,
}

#[derive(Debug, Serialize)]
struct StatusData<'a> {
    action: &'a str,
    /// `source` of the triggering event, when it had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<&'a str>,
    status: StatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

pub struct NdjsonReporter<W> {
    writer: Mutex<W>,
}

impl NdjsonReporter<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> NdjsonReporter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    async fn emit(
        &self,
        ctx: &RunContext,
        status: StatusKind,
        message: Option<&str>,
    ) -> Result<(), ReportError> {
        let (event_type, result) = match status {
            StatusKind::Started => (ctx.started_type(), None),
            StatusKind::Succeeded => (ctx.finished_type(), Some("pass")),
            StatusKind::Failed => (ctx.finished_type(), Some("fail")),
        };
        let event = StatusEvent {
            event_type,
            triggeredid: &ctx.event_id,
            source: &ctx.service_name,
            data: StatusData {
                action: &ctx.action_name,
                origin: ctx.source.as_deref(),
                status,
                result,
                message,
            },
        };
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<W> StatusReporter for NdjsonReporter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn report_started(&self, ctx: &RunContext) -> Result<(), ReportError> {
        self.emit(ctx, StatusKind::Started, None).await
    }

    async fn report_succeeded(&self, ctx: &RunContext, message: &str) -> Result<(), ReportError> {
        self.emit(ctx, StatusKind::Succeeded, Some(message)).await
    }

    async fn report_failed(&self, ctx: &RunContext, message: &str) -> Result<(), ReportError> {
        self.emit(ctx, StatusKind::Failed, Some(message)).await
    }
}
