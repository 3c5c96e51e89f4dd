use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use jobtrigger::config::{self as cfg, ExecutorSettings, FileConfigSource, ServiceSettings};
use jobtrigger::event::IncomingEvent;
use jobtrigger::executor::build_executor;
use jobtrigger::handler::{EventHandler, HandleOutcome};
use jobtrigger::orchestrator::RunState;
use jobtrigger::reporter::build_reporter;
use jobtrigger::sources;

/// jobtrigger CLI
#[derive(Debug, Parser)]
#[command(
    name = jobtrigger::PKG_NAME,
    version = jobtrigger::PKG_VERSION,
    about = "Run configured container jobs in response to lifecycle events"
)]
struct Args {
    /// Path to the JSON service settings file (defaults apply when omitted)
    #[arg(short = 's', long = "settings")]
    settings: Option<PathBuf>,

    /// Override the path of the YAML action document
    #[arg(short = 'a', long = "actions")]
    actions: Option<String>,

    /// Log tasks instead of running them on the container backend
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Print the JSON Schema for the settings file and exit
    #[arg(long = "print-schema")]
    print_schema: bool,

    /// Print the JSON Schema for the action document and exit
    #[arg(long = "print-actions-schema")]
    print_actions_schema: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    jobtrigger::init_tracing(args.log_level.as_deref());

    if args.print_schema || args.print_actions_schema {
        let schema = if args.print_schema {
            cfg::generate_schema()
        } else {
            cfg::generate_actions_schema()
        };
        cfg::write_schema_to_writer(&schema, std::io::stdout())?;
        println!();
        return Ok(());
    }

    let mut settings = match &args.settings {
        Some(path) => cfg::load_from_path_async(path).await?,
        None => ServiceSettings::default(),
    };
    if let Some(actions) = args.actions {
        settings.actions_path = actions;
    }
    if args.dry_run {
        settings.executor = ExecutorSettings::DryRun;
    }
    cfg::validate_settings(&settings)?;

    info!(
        version = jobtrigger::PKG_VERSION,
        service = %settings.service_name,
        actions = %settings.actions_path,
        executor = ?settings.executor,
        "Starting jobtrigger"
    );

    let handler = Arc::new(EventHandler::new(
        Arc::new(FileConfigSource::new(&settings.actions_path)),
        Arc::from(build_executor(&settings.executor)),
        Arc::from(build_reporter(settings.reporter)),
        settings.service_name.clone(),
        settings.job_prefix.clone(),
    ));

    let sources = sources::build_sources(&settings.sources);
    if sources.is_empty() {
        warn!("No event sources configured. Waiting for Ctrl+C and then exiting.");
    }

    let (tx, mut rx) = mpsc::channel::<Value>(256);
    let _handles = sources::spawn_all_sources(&sources, tx);

    let mut runs = JoinSet::new();
    tokio::select! {
        _ = async {
            while let Some(raw) = rx.recv().await {
                let event = match IncomingEvent::from_value(raw) {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(error = %err, "Dropping malformed event");
                        continue;
                    }
                };
                let handler = Arc::clone(&handler);
                runs.spawn(async move { handle_one(&handler, event).await });
                // Reap finished runs so the set does not grow unbounded.
                while runs.try_join_next().is_some() {}
            }
        } => {
            debug!("All event sources finished");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    if !runs.is_empty() {
        info!(pending = runs.len(), "Waiting for in-flight runs");
        while runs.join_next().await.is_some() {}
    }

    info!("jobtrigger exited");
    Ok(())
}

async fn handle_one(handler: &EventHandler, event: IncomingEvent) {
    match handler.handle_event(&event).await {
        Ok(HandleOutcome::NoMatch) => {}
        Ok(HandleOutcome::Completed(report)) => {
            let passed = report.state == RunState::Succeeded;
            info!(
                event_id = %event.id,
                action = %report.action,
                tasks = report.attempted,
                passed,
                "Event handled"
            );
        }
        Err(err) => {
            error!(event_id = %event.id, event_type = %event.event_type, error = %err, "Failed to handle event");
        }
    }
}
