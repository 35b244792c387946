//! Application state store
//!
//! The store is the single source of truth for loaded measurements and the
//! current selection. It is owned by the composition root (see
//! [`crate::frontend::ViewerApp`]) and passed explicitly to whatever needs
//! it; views read it through [`selectors`] and change it only by
//! dispatching an [`Action`].
//!
//! # State Shape
//!
//! ```text
//! AppState
//! ├── data
//! │   └── measurements: kind -> { entries: [Measurement] }
//! └── view
//!     ├── current_measurement_kind
//!     └── current_measurement
//! ```
//!
//! `view` is a two-slot state machine `(kind, measurement id)` starting at
//! `(None, None)`; the only transitions are the three [`Action`] variants.

pub mod action;
pub mod reducer;
pub mod selectors;

pub use action::Action;
pub use reducer::{reduce, reduce_value};
pub use selectors::current_measurement;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Measurement;

/// Measurements of one kind, in insertion order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementGroup {
    #[serde(default)]
    pub entries: Vec<Measurement>,
}

impl MeasurementGroup {
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Measurement> {
        self.entries.iter().find(|m| m.id == id)
    }

    pub fn first(&self) -> Option<&Measurement> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loaded data, grouped by measurement kind (kinds in first-seen order)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataState {
    #[serde(default)]
    pub measurements: IndexMap<String, MeasurementGroup>,
}

/// What is currently selected
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_measurement_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_measurement: Option<String>,
}

/// Complete application state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub data: DataState,
    pub view: ViewState,
}

/// Owner of the [`AppState`]
///
/// Every change goes through [`Store::dispatch`]. The revision counter is
/// bumped whenever a dispatch actually changes the state, so views can cache
/// derived data (plot points) per revision.
#[derive(Debug, Default)]
pub struct Store {
    state: AppState,
    revision: u64,
}

impl Store {
    /// Create a store with an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store around an existing state
    pub fn with_state(state: AppState) -> Self {
        Self { state, revision: 0 }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Run an action through the reducer
    pub fn dispatch(&mut self, action: Action) {
        let action_type = action.type_name();
        let loads_data = matches!(&action, Action::LoadFiles { measurements } if !measurements.is_empty());
        let view_before = self.state.view.clone();

        self.state = reduce(std::mem::take(&mut self.state), action);

        if loads_data || self.state.view != view_before {
            self.revision += 1;
            tracing::debug!(action = action_type, revision = self.revision, "State updated");
        } else {
            tracing::trace!(action = action_type, "Action left state unchanged");
        }
    }

    /// Validate and dispatch an action given as JSON
    ///
    /// An action type outside the closed set is returned as
    /// [`crate::error::ViewerError::UnknownAction`] and leaves the state as
    /// it was.
    pub fn dispatch_value(&mut self, value: serde_json::Value) -> Result<()> {
        let action = Action::from_value(value)?;
        self.dispatch(action);
        Ok(())
    }

    /// The measurement the view points at, if any
    pub fn current_measurement(&self) -> Option<&Measurement> {
        selectors::current_measurement(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewerError;
    use serde_json::json;

    #[test]
    fn test_new_store_is_empty() {
        let store = Store::new();
        assert!(store.state().data.measurements.is_empty());
        assert_eq!(store.state().view, ViewState::default());
        assert_eq!(store.revision(), 0);
        assert!(store.current_measurement().is_none());
    }

    #[test]
    fn test_revision_only_moves_on_change() {
        let mut store = Store::new();
        store.dispatch(Action::load_files(vec![Measurement::new("m1", "1h")]));
        assert_eq!(store.revision(), 1);

        store.dispatch(Action::select_measurement("missing", "1h"));
        assert_eq!(store.revision(), 1);

        store.dispatch(Action::select_kind("1h"));
        assert_eq!(store.revision(), 2);

        store.dispatch(Action::select_kind("1h"));
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn test_dispatch_value_rejects_unknown_type() {
        let mut store = Store::new();
        store.dispatch(Action::load_files(vec![Measurement::new("m1", "1h")]));
        let before = store.state().clone();

        let err = store
            .dispatch_value(json!({"type": "RESET_EVERYTHING", "payload": {}}))
            .unwrap_err();
        assert!(matches!(err, ViewerError::UnknownAction(ref t) if t == "RESET_EVERYTHING"));
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_dispatch_value_applies_known_action() {
        let mut store = Store::new();
        store
            .dispatch_value(json!({
                "type": "LOAD_FILES",
                "payload": {"measurements": [{"id": "m1", "kind": "ir", "data": []}]}
            }))
            .unwrap();
        store
            .dispatch_value(json!({"type": "SELECT_MEASUREMENT_KIND", "payload": {"kind": "ir"}}))
            .unwrap();
        assert_eq!(store.current_measurement().map(|m| m.id.as_str()), Some("m1"));
    }

    #[test]
    fn test_view_state_wire_names() {
        let view = ViewState {
            current_measurement_kind: Some("ir".to_string()),
            current_measurement: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json, json!({"currentMeasurementKind": "ir"}));
    }
}
