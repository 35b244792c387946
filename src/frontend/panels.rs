//! Side and table panels
//!
//! - Measurements panel: one tab per kind and the measurements of the
//!   current kind
//! - IR peaks panel: table of the current entry's peaks

use egui::{RichText, Ui};

use super::state::UiAction;
use crate::config::PeaksTablePreferences;
use crate::store::{selectors, Action, AppState};
use crate::types::IrPeak;

/// Placeholder for values a peak does not have
pub const MISSING_VALUE: &str = "-";

/// One kind tab
#[derive(Debug, Clone, PartialEq)]
pub struct KindTab<'a> {
    pub kind: &'a str,
    pub count: usize,
    pub selected: bool,
}

/// Kind tabs in first-loaded order
pub fn kind_tabs(state: &AppState) -> Vec<KindTab<'_>> {
    let current = state.view.current_measurement_kind.as_deref();
    state
        .data
        .measurements
        .iter()
        .map(|(kind, group)| KindTab {
            kind,
            count: group.len(),
            selected: current == Some(kind),
        })
        .collect()
}

/// Render the measurements panel
pub fn render_measurements_panel(ui: &mut Ui, state: &AppState) -> Vec<UiAction> {
    let mut actions = Vec::new();

    ui.horizontal_wrapped(|ui| {
        for tab in kind_tabs(state) {
            let text = format!("{} ({})", tab.kind, tab.count);
            if ui.selectable_label(tab.selected, text).clicked() && !tab.selected {
                actions.push(UiAction::Dispatch(Action::select_kind(tab.kind)));
            }
        }
    });

    ui.separator();

    let Some(kind) = state.view.current_measurement_kind.as_deref() else {
        ui.label(RichText::new("No kind selected").weak());
        return actions;
    };

    let current = state.view.current_measurement.as_deref();
    egui::ScrollArea::vertical()
        .id_salt("measurement_list")
        .show(ui, |ui| {
            for measurement in selectors::measurements_of_kind(state, kind) {
                let selected = current == Some(measurement.id.as_str());
                let response = ui
                    .selectable_label(selected, measurement.display_name())
                    .on_hover_text(&measurement.id);
                if response.clicked() && !selected {
                    actions.push(UiAction::Dispatch(Action::select_measurement(
                        &measurement.id,
                        kind,
                    )));
                }
            }
        });

    actions
}

/// Table cells for the visible columns, missing values as a dash
pub fn peak_rows(peaks: &[IrPeak], prefs: &PeaksTablePreferences) -> Vec<Vec<String>> {
    peaks
        .iter()
        .map(|peak| {
            prefs
                .visible_columns()
                .map(|column| {
                    peak.display_field(&column.jpath)
                        .unwrap_or_else(|| MISSING_VALUE.to_string())
                })
                .collect()
        })
        .collect()
}

/// Render the IR peaks table
pub fn render_peaks_panel(
    ui: &mut Ui,
    peaks: &[IrPeak],
    prefs: &PeaksTablePreferences,
) -> Vec<UiAction> {
    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        ui.strong(format!("IR peaks ({})", peaks.len()));
        ui.menu_button("Columns", |ui| {
            for (index, column) in prefs.columns.iter().enumerate() {
                let mut visible = column.visible;
                if ui.checkbox(&mut visible, &column.label).changed() {
                    actions.push(UiAction::TogglePeakColumn(index));
                }
            }
        });
    });

    if peaks.is_empty() {
        ui.label(RichText::new("No peaks").weak());
        return actions;
    }

    egui::ScrollArea::vertical()
        .id_salt("peaks_table")
        .show(ui, |ui| {
            egui::Grid::new("ir_peaks")
                .striped(true)
                .num_columns(prefs.visible_columns().count())
                .show(ui, |ui| {
                    for column in prefs.visible_columns() {
                        ui.strong(&column.label);
                    }
                    ui.end_row();

                    for row in peak_rows(peaks, prefs) {
                        for cell in row {
                            ui.monospace(cell);
                        }
                        ui.end_row();
                    }
                });
        });

    actions
}
