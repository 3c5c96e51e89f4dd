//! Where the action document comes from.
//!
//! The orchestration core never caches the document: [`load_action_config`]
//! fetches and parses a fresh snapshot every time it is called.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::actions::ActionConfig;
use crate::error::ConfigError;

/// Supplies the raw bytes of the action configuration document.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Human-readable location of the document (used in logs and errors).
    fn location(&self) -> String;

    /// Fetch the current document contents.
    async fn fetch(&self) -> Result<Vec<u8>, ConfigError>;
}

/// Reads the action document from a file on every fetch.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigSource for FileConfigSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<u8>, ConfigError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| ConfigError::Fetch {
                location: self.location(),
                source,
            })
    }
}

/// Fetch and parse a fresh action configuration snapshot.
pub async fn load_action_config(source: &dyn ConfigSource) -> Result<ActionConfig, ConfigError> {
    let raw = source.fetch().await.inspect_err(|e| {
        warn!(
            target: "jobtrigger::config",
            location = %source.location(), error = %e,
            "Could not fetch action config"
        );
    })?;

    match ActionConfig::from_yaml(&raw) {
        Ok(cfg) => {
            debug!(
                target: "jobtrigger::config",
                location = %source.location(),
                actions = cfg.actions.len(),
                "Loaded action config"
            );
            Ok(cfg)
        }
        Err(e) => {
            warn!(
                target: "jobtrigger::config",
                location = %source.location(), error = %e,
                config = %String::from_utf8_lossy(&raw),
                "Could not parse action config"
            );
            Err(e)
        }
    }
}
