//! Configuration module for jobtrigger.
//!
//! Two documents live here:
//! - the YAML action document (`actions`), fetched through a `ConfigSource`
//!   and parsed fresh for every event;
//! - the JSON service settings (`models`, `loader`), loaded once at startup.
//!
//! Example:
//! use jobtrigger::config::{load_from_path, FileConfigSource};
//!
//! let settings = load_from_path("jobtrigger.json")?;
//! let source = FileConfigSource::new(&settings.actions_path);

pub mod actions;
pub mod loader;
pub mod models;
pub mod source;

pub use actions::{Action, ActionConfig, Predicate, Task};
pub use models::{ExecutorSettings, ReporterSettings, ServiceSettings, SourceConfig};
pub use source::{ConfigSource, FileConfigSource, load_action_config};

pub use loader::{
    generate_actions_schema, generate_schema, load_from_path, load_from_path_async,
    load_from_reader, load_from_str, validate_settings, write_schema_to_writer,
};
