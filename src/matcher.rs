//! Selects the action an incoming event activates.
//!
//! Actions are scanned in declaration order and the first one whose event
//! type matches and whose predicate holds wins. A predicate whose path is
//! malformed or does not resolve is simply false; it never aborts the scan.

use serde_json::Value;
use tracing::{debug, trace};

use crate::config::{Action, ActionConfig, Predicate};
use crate::utils::json_path;

/// Return the first action in `config` triggered by `event_type` + `payload`.
pub fn match_action<'a>(
    event_type: &str,
    payload: &Value,
    config: &'a ActionConfig,
) -> Option<&'a Action> {
    for action in &config.actions {
        if action.event_type != event_type {
            continue;
        }
        if predicate_holds(&action.predicate, payload) {
            debug!(
                target: "jobtrigger::matcher",
                action = %action.name, %event_type,
                "Action matched"
            );
            return Some(action);
        }
    }
    trace!(target: "jobtrigger::matcher", %event_type, "No action matched");
    None
}

/// Evaluate one predicate against a payload.
pub fn predicate_holds(predicate: &Predicate, payload: &Value) -> bool {
    let Some(segments) = json_path::parse_path(&predicate.path) else {
        debug!(
            target: "jobtrigger::matcher",
            path = %predicate.path,
            "Malformed predicate path; treating as no match"
        );
        return false;
    };

    match json_path::resolve(payload, &segments) {
        Some(value) => json_path::value_to_string(value) == predicate.expected,
        None => {
            trace!(
                target: "jobtrigger::matcher",
                path = %predicate.path,
                "Predicate path not present in payload"
            );
            false
        }
    }
}
