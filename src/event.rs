//! Incoming event envelope.
//!
//! Sources deliver raw JSON values shaped like a CloudEvent:
//! `{"id": "...", "type": "...", "source": "...", "data": {...}}`.
//! `type` is required and must be a non-empty string. `id` may be omitted
//! (it then reads [`UNKNOWN_EVENT_ID`]) but must be a non-empty string when
//! present. `data` becomes the payload the matcher inspects.

use serde::Deserialize;
use serde_json::Value;

use crate::error::EventError;

/// Event id used when the envelope carries none.
pub const UNKNOWN_EVENT_ID: &str = "unknown";

fn unknown_event_id() -> String {
    UNKNOWN_EVENT_ID.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncomingEvent {
    #[serde(default = "unknown_event_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl IncomingEvent {
    pub fn new(id: impl Into<String>, event_type: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            source: None,
            data,
        }
    }

    /// Decode an envelope. Takes ownership so the payload is moved, not copied.
    pub fn from_value(value: Value) -> Result<Self, EventError> {
        if !value.is_object() {
            return Err(EventError::NotAnObject);
        }
        let event: Self = serde_json::from_value(value)?;
        if event.event_type.is_empty() {
            return Err(EventError::EmptyField("type"));
        }
        if event.id.is_empty() {
            return Err(EventError::EmptyField("id"));
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_full_envelope() {
        let ev = IncomingEvent::from_value(json!({
            "id": "e-42",
            "type": "sh.keptn.event.test.triggered",
            "source": "shipyard-controller",
            "specversion": "1.0",
            "data": {"test": {"strategy": "functional"}}
        }))
        .unwrap();
        assert_eq!(ev.id, "e-42");
        assert_eq!(ev.event_type, "sh.keptn.event.test.triggered");
        assert_eq!(ev.source.as_deref(), Some("shipyard-controller"));
        assert_eq!(ev.data, json!({"test": {"strategy": "functional"}}));
    }

    #[test]
    fn test_from_value_defaults() {
        let ev = IncomingEvent::from_value(json!({"type": "t"})).unwrap();
        assert_eq!(ev.id, UNKNOWN_EVENT_ID);
        assert!(ev.source.is_none());
        assert_eq!(ev.data, Value::Null);
    }

    #[test]
    fn test_from_value_rejects_bad_envelopes() {
        assert!(matches!(
            IncomingEvent::from_value(json!([1, 2])),
            Err(EventError::NotAnObject)
        ));
        assert!(matches!(
            IncomingEvent::from_value(json!({"data": {}})),
            Err(EventError::Decode(_))
        ));
        assert!(matches!(
            IncomingEvent::from_value(json!({"type": 5})),
            Err(EventError::Decode(_))
        ));
        assert!(matches!(
            IncomingEvent::from_value(json!({"type": ""})),
            Err(EventError::EmptyField("type"))
        ));
    }

    #[test]
    fn test_from_value_rejects_bad_ids() {
        assert!(matches!(
            IncomingEvent::from_value(json!({"type": "t", "id": 7})),
            Err(EventError::Decode(_))
        ));
        assert!(matches!(
            IncomingEvent::from_value(json!({"type": "t", "id": ""})),
            Err(EventError::EmptyField("id"))
        ));
    }
}
