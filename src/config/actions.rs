use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::ConfigError;

/// Root of the action configuration document.
///
/// The document is YAML and is fetched and parsed again for every incoming
/// event, so an `ActionConfig` is a per-event snapshot:
///
/// ```yaml
/// actions:
///   - name: deploy-job
///     event: sh.keptn.event.test.triggered
///     jsonpath:
///       property: $.test.strategy
///       match: functional
///     tasks:
///       - name: build
///         files: [build/script.sh]
///         image: alpine:3.20
///         cmd: sh /keptn/build/script.sh
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionConfig {
    /// Actions in declaration order. The first matching entry wins.
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A named rule pairing an event-match predicate with an ordered task list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    pub name: String,

    /// Exact event type this action reacts to.
    #[serde(rename = "event")]
    pub event_type: String,

    #[serde(rename = "jsonpath")]
    pub predicate: Predicate,

    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Lookup path into the event payload plus the literal it must equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Predicate {
    #[serde(rename = "property")]
    pub path: String,

    /// Compared against the resolved value's string form.
    #[serde(rename = "match")]
    pub expected: String,
}

/// One declarative unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Task {
    pub name: String,

    /// Inputs made available to the execution.
    #[serde(default)]
    pub files: BTreeSet<String>,

    /// Execution environment (container image).
    pub image: String,

    #[serde(rename = "cmd")]
    pub command: String,
}

impl ActionConfig {
    /// Parse a YAML action document.
    pub fn from_yaml(content: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_slice(content)?)
    }

    /// Look up an action by name. Assumes names are unique; returns the first hit.
    pub fn find_action_by_name(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }
}

impl Action {
    pub fn find_task_by_name(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }
}
