use anyhow::{Context, Result, bail};
use schemars::{Schema, schema_for};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

use super::actions::ActionConfig;
use super::models::{ExecutorSettings, ServiceSettings, SourceConfig};

/// Load service settings from a string slice.
pub fn load_from_str(s: &str) -> Result<ServiceSettings> {
    let settings: ServiceSettings =
        serde_json::from_str(s).context("Failed to parse JSON settings string")?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Load service settings from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> Result<ServiceSettings> {
    let settings: ServiceSettings =
        serde_json::from_reader(reader).context("Failed to parse JSON settings from reader")?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Load service settings from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ServiceSettings> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open settings file {}", path_ref.display()))?;
    let settings = load_from_reader(file)?;
    debug!("Loaded settings from {}", path_ref.display());
    Ok(settings)
}

/// Load service settings from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<ServiceSettings> {
    let path_ref = path.as_ref();
    let bytes = tokio::fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read settings file {}", path_ref.display()))?;
    let settings: ServiceSettings = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON settings from {}", path_ref.display()))?;
    validate_settings(&settings)?;
    debug!("Loaded settings from {}", path_ref.display());
    Ok(settings)
}

/// JSON Schema for the service settings file.
pub fn generate_schema() -> Schema {
    schema_for!(ServiceSettings)
}

/// JSON Schema for the YAML action document.
pub fn generate_actions_schema() -> Schema {
    schema_for!(ActionConfig)
}

/// Write a schema to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(schema: &Schema, mut writer: W) -> Result<()> {
    let json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}

/// Sanity checks that serde cannot express.
pub fn validate_settings(settings: &ServiceSettings) -> Result<()> {
    if settings.service_name.trim().is_empty() {
        bail!("`service_name` must not be empty");
    }
    if settings.actions_path.trim().is_empty() {
        bail!("`actions_path` must not be empty");
    }
    if settings.job_prefix.trim().is_empty() {
        bail!("`job_prefix` must not be empty");
    }

    if let ExecutorSettings::Container {
        runtime,
        mount_path,
        ..
    } = &settings.executor
    {
        if runtime.trim().is_empty() {
            bail!("`executor.runtime` must not be empty");
        }
        if !mount_path.starts_with('/') {
            bail!("`executor.mount_path` must be absolute, got '{}'", mount_path);
        }
    }

    for (idx, source) in settings.sources.iter().enumerate() {
        if let SourceConfig::Tcp { bind } = source {
            bind.parse::<std::net::SocketAddr>().with_context(|| {
                format!("Invalid bind address '{}' for source at index {}", bind, idx)
            })?;
        }
    }

    Ok(())
}
