//! The reducer: `(AppState, Action) -> AppState`
//!
//! Pure and deterministic. No logging, no I/O.

use serde_json::Value;

use super::{Action, AppState, DataState, MeasurementGroup};
use crate::error::Result;
use crate::types::Measurement;

/// Apply an action to a state
pub fn reduce(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::LoadFiles { measurements } => merge_measurements(&mut state.data, measurements),
        Action::SelectMeasurementKind { kind } => select_measurement_kind(&mut state, kind),
        Action::SelectMeasurement { id, kind } => select_measurement(&mut state, id, kind),
    }
    state
}

/// Apply a JSON action to a state
///
/// Unknown or malformed actions are errors; the input state is untouched.
pub fn reduce_value(state: &AppState, value: Value) -> Result<AppState> {
    let action = Action::from_value(value)?;
    Ok(reduce(state.clone(), action))
}

/// Merge by id: replace in place within the same kind, move across kinds,
/// append otherwise.
fn merge_measurements(data: &mut DataState, incoming: Vec<Measurement>) {
    for measurement in incoming {
        let kind = measurement.kind.clone();

        let mut moved = false;
        for (group_kind, group) in data.measurements.iter_mut() {
            if *group_kind != kind {
                let before = group.entries.len();
                group.entries.retain(|m| m.id != measurement.id);
                moved |= group.entries.len() != before;
            }
        }
        if moved {
            data.measurements.retain(|_, group| !group.is_empty());
        }

        let group = data.measurements.entry(kind).or_default();
        match group.position(&measurement.id) {
            Some(index) => group.entries[index] = measurement,
            None => group.entries.push(measurement),
        }
    }
}

fn select_measurement_kind(state: &mut AppState, kind: String) {
    let group = state.data.measurements.get(&kind);

    let still_valid = match (&state.view.current_measurement, group) {
        (Some(id), Some(group)) => group.contains(id),
        _ => false,
    };
    if !still_valid {
        state.view.current_measurement = group
            .and_then(MeasurementGroup::first)
            .map(|m| m.id.clone());
    }
    state.view.current_measurement_kind = Some(kind);
}

fn select_measurement(state: &mut AppState, id: String, kind: String) {
    let exists = state
        .data
        .measurements
        .get(&kind)
        .is_some_and(|group| group.contains(&id));
    if exists {
        state.view.current_measurement_kind = Some(kind);
        state.view.current_measurement = Some(id);
    }
}
