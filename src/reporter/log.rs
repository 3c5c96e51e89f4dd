//! Status reporter backed by `tracing`.
//!
//! The event source is recorded only when the envelope carried one.

use async_trait::async_trait;
use tracing::{error, info};

use super::{RunContext, StatusReporter};
use crate::error::ReportError;

/// Reporter that turns status notifications into tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

#[async_trait]
impl StatusReporter for TracingReporter {
    async fn report_started(&self, ctx: &RunContext) -> Result<(), ReportError> {
        info!(
            target: "jobtrigger::status",
            event_id = %ctx.event_id, event_type = %ctx.started_type(),
            service = %ctx.service_name, action = %ctx.action_name,
            run_id = %ctx.run_id, source = ctx.source.as_deref(),
            "Action started"
        );
        Ok(())
    }

    async fn report_succeeded(&self, ctx: &RunContext, message: &str) -> Result<(), ReportError> {
        info!(
            target: "jobtrigger::status",
            event_id = %ctx.event_id, event_type = %ctx.finished_type(),
            service = %ctx.service_name, action = %ctx.action_name,
            run_id = %ctx.run_id, source = ctx.source.as_deref(),
            %message,
            "Action succeeded"
        );
        Ok(())
    }

    async fn report_failed(&self, ctx: &RunContext, message: &str) -> Result<(), ReportError> {
        error!(
            target: "jobtrigger::status",
            event_id = %ctx.event_id, event_type = %ctx.finished_type(),
            service = %ctx.service_name, action = %ctx.action_name,
            run_id = %ctx.run_id, source = ctx.source.as_deref(),
            %message,
            "Action failed"
        );
        Ok(())
    }
}
