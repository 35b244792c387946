//! Read-only views over the [`AppState`]
//!
//! Selectors never fail: a dangling selection reads as "nothing selected".

use super::AppState;
use crate::types::Measurement;

/// The measurement referenced by the view, if it still exists in the
/// selected kind
pub fn current_measurement(state: &AppState) -> Option<&Measurement> {
    let kind = state.view.current_measurement_kind.as_deref()?;
    let id = state.view.current_measurement.as_deref()?;
    state.data.measurements.get(kind)?.get(id)
}

/// Loaded kinds in first-seen order
pub fn kinds(state: &AppState) -> impl Iterator<Item = &str> {
    state.data.measurements.keys().map(String::as_str)
}

/// Measurements of one kind, empty for an unknown kind
pub fn measurements_of_kind<'a>(state: &'a AppState, kind: &str) -> &'a [Measurement] {
    state
        .data
        .measurements
        .get(kind)
        .map(|group| group.entries.as_slice())
        .unwrap_or(&[])
}

/// All measurements, grouped by kind order then insertion order
pub fn all_measurements(state: &AppState) -> impl Iterator<Item = &Measurement> {
    state
        .data
        .measurements
        .values()
        .flat_map(|group| group.entries.iter())
}

/// Look up a measurement by id regardless of kind
pub fn find_measurement<'a>(state: &'a AppState, id: &str) -> Option<&'a Measurement> {
    all_measurements(state).find(|m| m.id == id)
}

pub fn measurement_count(state: &AppState) -> usize {
    state.data.measurements.values().map(|g| g.len()).sum()
}
