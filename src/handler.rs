//! Top-level event handling.
//!
//! For every event: fetch and parse a fresh action config, pick the matching
//! action, run it. Only configuration failures come back as `Err`; a failed
//! action is a successfully handled event whose outcome is a failure report.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::{ConfigSource, load_action_config};
use crate::error::ConfigError;
use crate::event::IncomingEvent;
use crate::executor::{TaskExecutor, new_run_id};
use crate::matcher::match_action;
use crate::orchestrator::{ActionOrchestrator, RunReport};
use crate::reporter::{RunContext, StatusReporter};

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// No configured action applies to this event.
    NoMatch,
    /// An action ran to completion (successfully or not).
    Completed(RunReport),
}

/// Shared, immutable wiring between the collaborators. Cheap to share across
/// tasks; each `handle_event` call builds its own config snapshot and run.
pub struct EventHandler {
    config_source: Arc<dyn ConfigSource>,
    executor: Arc<dyn TaskExecutor>,
    reporter: Arc<dyn StatusReporter>,
    service_name: String,
    job_prefix: String,
}

impl EventHandler {
    pub fn new(
        config_source: Arc<dyn ConfigSource>,
        executor: Arc<dyn TaskExecutor>,
        reporter: Arc<dyn StatusReporter>,
        service_name: impl Into<String>,
        job_prefix: impl Into<String>,
    ) -> Self {
        Self {
            config_source,
            executor,
            reporter,
            service_name: service_name.into(),
            job_prefix: job_prefix.into(),
        }
    }

    #[instrument(
        target = "jobtrigger::handler",
        skip_all,
        fields(event_id = %event.id, event_type = %event.event_type)
    )]
    pub async fn handle_event(&self, event: &IncomingEvent) -> Result<HandleOutcome, ConfigError> {
        info!(target: "jobtrigger::handler", "Attempting to handle event");

        let config = load_action_config(self.config_source.as_ref()).await?;

        let Some(action) = match_action(&event.event_type, &event.data, &config) else {
            info!(target: "jobtrigger::handler", "No match found for event; skipping");
            return Ok(HandleOutcome::NoMatch);
        };

        let run_id = new_run_id();
        info!(
            target: "jobtrigger::handler",
            action = %action.name, tasks = action.tasks.len(), %run_id,
            "Match found; running action"
        );

        let ctx = RunContext {
            event_id: event.id.clone(),
            run_id,
            event_type: event.event_type.clone(),
            source: event.source.clone(),
            service_name: self.service_name.clone(),
            action_name: action.name.clone(),
        };
        let orchestrator = ActionOrchestrator::new(
            Arc::clone(&self.executor),
            Arc::clone(&self.reporter),
            self.job_prefix.as_str(),
        );
        let report = orchestrator.run(action, &ctx).await;
        Ok(HandleOutcome::Completed(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::RunState;
    use crate::reporter::StatusKind;
    use crate::testing::{Call, RecordingExecutor, RecordingReporter, StaticConfigSource};
    use serde_json::json;

    const CONFIG: &str = r#"
actions:
  - name: perf-job
    event: test.triggered
    jsonpath:
      property: $.test.strategy
      match: performance
    tasks:
      - name: load
        image: grafana/k6
        cmd: k6 run /keptn/load.js
  - name: deploy-job
    event: test.triggered
    jsonpath:
      property: test.strategy
      match: functional
    tasks:
      - name: build
        files: [build.sh]
        image: alpine:3.20
        cmd: sh /keptn/build.sh
      - name: deploy
        image: bitnami/kubectl
        cmd: kubectl apply -f /keptn/manifest.yaml
"#;

    struct Fixture {
        source: Arc<StaticConfigSource>,
        exec: Arc<RecordingExecutor>,
        rep: Arc<RecordingReporter>,
        handler: EventHandler,
    }

    fn fixture(source: StaticConfigSource, exec: RecordingExecutor) -> Fixture {
        let source = Arc::new(source);
        let exec = Arc::new(exec);
        let rep = Arc::new(RecordingReporter::new());
        let handler = EventHandler::new(
            source.clone(),
            exec.clone(),
            rep.clone(),
            "jobtrigger",
            "jobtrigger",
        );
        Fixture {
            source,
            exec,
            rep,
            handler,
        }
    }

    fn functional_event() -> IncomingEvent {
        let mut ev = IncomingEvent::new(
            "e1",
            "test.triggered",
            json!({"test": {"strategy": "functional"}}),
        );
        ev.source = Some("shipyard".into());
        ev
    }

    #[tokio::test]
    async fn test_deploy_job_scenario() {
        let f = fixture(
            StaticConfigSource::new(CONFIG),
            RecordingExecutor::new()
                .with_logs("build", "build ok")
                .failing_create("deploy", "image pull failed"),
        );

        let outcome = f.handler.handle_event(&functional_event()).await.unwrap();
        let HandleOutcome::Completed(report) = outcome else {
            panic!("expected the deploy-job action to run");
        };
        assert_eq!(report.action, "deploy-job");
        assert_eq!(report.state, RunState::Failed);
        assert_eq!(f.exec.count(|c| matches!(c, Call::Create { .. })), 2);
        assert_eq!(f.exec.count(|c| matches!(c, Call::Release { .. })), 2);
        assert_eq!(f.rep.kinds(), vec![StatusKind::Started, StatusKind::Failed]);

        let msg = f.rep.terminal_message().unwrap();
        assert!(msg.contains("image pull failed"));
        assert!(msg.contains("build ok"));

        let ctx = &f.rep.contexts()[0];
        assert_eq!(ctx.event_id, "e1");
        assert_eq!(ctx.action_name, "deploy-job");
        assert_eq!(ctx.source.as_deref(), Some("shipyard"));
    }

    #[tokio::test]
    async fn test_no_match_runs_nothing() {
        let f = fixture(StaticConfigSource::new(CONFIG), RecordingExecutor::new());
        let ev = IncomingEvent::new("e2", "test.triggered", json!({"test": {"strategy": "chaos"}}));

        assert_eq!(f.handler.handle_event(&ev).await.unwrap(), HandleOutcome::NoMatch);
        assert!(f.exec.calls().is_empty());
        assert!(f.rep.kinds().is_empty());
    }

    #[tokio::test]
    async fn test_config_errors_propagate_without_reports() {
        let f = fixture(StaticConfigSource::unavailable(), RecordingExecutor::new());
        let err = f.handler.handle_event(&functional_event()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Fetch { .. }));
        assert!(f.rep.kinds().is_empty());

        let f = fixture(StaticConfigSource::new("actions: {"), RecordingExecutor::new());
        let err = f.handler.handle_event(&functional_event()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(f.exec.calls().is_empty());
    }

    #[tokio::test]
    async fn test_config_fetched_for_every_event() {
        let f = fixture(StaticConfigSource::new(CONFIG), RecordingExecutor::new());
        f.handler.handle_event(&functional_event()).await.unwrap();
        f.handler.handle_event(&functional_event()).await.unwrap();
        assert_eq!(f.source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_events_run_independently() {
        let f = fixture(
            StaticConfigSource::new(CONFIG),
            RecordingExecutor::new().with_logs("build", "b").with_logs("deploy", "d"),
        );
        let handler = Arc::new(f.handler);

        let mut joins = Vec::new();
        for i in 0..4 {
            let handler = Arc::clone(&handler);
            joins.push(tokio::spawn(async move {
                let ev = IncomingEvent::new(
                    format!("e{i}"),
                    "test.triggered",
                    json!({"test": {"strategy": "functional"}}),
                );
                handler.handle_event(&ev).await
            }));
        }
        for join in joins {
            let outcome = join.await.unwrap().unwrap();
            let HandleOutcome::Completed(report) = outcome else {
                panic!("expected a run");
            };
            assert_eq!(report.state, RunState::Succeeded);
            assert_eq!(report.logs.concat(), "bd");
        }
        assert_eq!(f.exec.count(|c| matches!(c, Call::Create { .. })), 8);
        assert_eq!(f.exec.count(|c| matches!(c, Call::Release { .. })), 8);
        assert_eq!(f.rep.kinds().len(), 8);
    }

    fn create_handles(exec: &RecordingExecutor) -> Vec<String> {
        exec.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create { handle, .. } => Some(handle),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_runs_sharing_an_event_id_get_disjoint_handles() {
        let f = fixture(
            StaticConfigSource::new(CONFIG),
            RecordingExecutor::new().with_logs("build", "b"),
        );
        let envelope = json!({
            "type": "test.triggered",
            "data": {"test": {"strategy": "functional"}}
        });
        let no_id_a = IncomingEvent::from_value(envelope.clone()).unwrap();
        let no_id_b = IncomingEvent::from_value(envelope).unwrap();
        assert_eq!(no_id_a.id, no_id_b.id);
        let (same_a, same_b) = (functional_event(), functional_event());

        let (a, b, c, d) = tokio::join!(
            f.handler.handle_event(&no_id_a),
            f.handler.handle_event(&no_id_b),
            f.handler.handle_event(&same_a),
            f.handler.handle_event(&same_b),
        );
        for outcome in [a, b, c, d] {
            assert!(matches!(outcome.unwrap(), HandleOutcome::Completed(_)));
        }

        let handles = create_handles(&f.exec);
        assert_eq!(handles.len(), 8);
        let distinct: std::collections::HashSet<&String> = handles.iter().collect();
        assert_eq!(distinct.len(), handles.len(), "handles reused: {handles:?}");

        let run_ids: std::collections::HashSet<String> =
            f.rep.contexts().into_iter().map(|ctx| ctx.run_id).collect();
        assert_eq!(run_ids.len(), 4);
    }
}
