//! Store actions
//!
//! The action set is closed. In code this is the [`Action`] enum; actions
//! arriving as JSON (`{"type": ..., "payload": ...}`) go through
//! [`Action::from_value`], which refuses any type outside the set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ViewerError};
use crate::types::Measurement;

/// Wire names of every action type
pub const ACTION_TYPES: [&str; 3] = ["LOAD_FILES", "SELECT_MEASUREMENT_KIND", "SELECT_MEASUREMENT"];

/// A state transition request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Merge measurements into the data, replacing entries with the same id
    LoadFiles { measurements: Vec<Measurement> },
    /// Switch the displayed kind
    SelectMeasurementKind { kind: String },
    /// Select one measurement of a kind
    SelectMeasurement { id: String, kind: String },
}

impl Action {
    pub fn load_files(measurements: Vec<Measurement>) -> Self {
        Action::LoadFiles { measurements }
    }

    pub fn select_kind(kind: impl Into<String>) -> Self {
        Action::SelectMeasurementKind { kind: kind.into() }
    }

    pub fn select_measurement(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Action::SelectMeasurement {
            id: id.into(),
            kind: kind.into(),
        }
    }

    /// Wire name of this action's type
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::LoadFiles { .. } => ACTION_TYPES[0],
            Action::SelectMeasurementKind { .. } => ACTION_TYPES[1],
            Action::SelectMeasurement { .. } => ACTION_TYPES[2],
        }
    }

    /// Decode a JSON action
    ///
    /// Fails with [`ViewerError::UnknownAction`] when `type` is not one of
    /// [`ACTION_TYPES`] and with [`ViewerError::InvalidAction`] when the
    /// type is missing or the payload does not match it.
    pub fn from_value(value: Value) -> Result<Self> {
        let action_type = match value.get("type") {
            Some(Value::String(t)) => t.clone(),
            _ => {
                return Err(ViewerError::InvalidAction {
                    action: "<missing>".to_string(),
                    message: "action has no string `type` field".to_string(),
                })
            }
        };

        if !ACTION_TYPES.contains(&action_type.as_str()) {
            return Err(ViewerError::UnknownAction(action_type));
        }

        serde_json::from_value(value).map_err(|e| ViewerError::InvalidAction {
            action: action_type,
            message: e.to_string(),
        })
    }

    /// Decode an action from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let action = Action::select_measurement("m2", "13c");
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(
            value,
            json!({"type": "SELECT_MEASUREMENT", "payload": {"id": "m2", "kind": "13c"}})
        );
        assert_eq!(Action::from_value(value).unwrap(), action);
    }

    #[test]
    fn test_type_names_match_wire_names() {
        for action in [
            Action::load_files(Vec::new()),
            Action::select_kind("ir"),
            Action::select_measurement("a", "ir"),
        ] {
            let value = serde_json::to_value(&action).unwrap();
            assert_eq!(value["type"], action.type_name());
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = Action::from_json(r#"{"type": "UNDO", "payload": null}"#).unwrap_err();
        assert!(matches!(err, ViewerError::UnknownAction(ref t) if t == "UNDO"));
    }

    #[test]
    fn test_missing_type_is_invalid() {
        let err = Action::from_value(json!({"payload": {"kind": "ir"}})).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidAction { .. }));
    }

    #[test]
    fn test_malformed_payload_is_invalid() {
        let err = Action::from_value(json!({"type": "SELECT_MEASUREMENT", "payload": {"id": "m1"}}))
            .unwrap_err();
        match err {
            ViewerError::InvalidAction { action, .. } => assert_eq!(action, "SELECT_MEASUREMENT"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
