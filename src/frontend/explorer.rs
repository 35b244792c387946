//! Measurement explorer
//!
//! View-local state for plotting the current measurement: which data entry
//! is shown, which variables go on each axis and whether the horizontal
//! axis is flipped. None of this lives in the store.

use egui::Ui;

use super::plot::PlotSeries;
use crate::types::{Measurement, MeasurementData};

/// Explorer selection for one measurement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExplorerInfo {
    pub data_index: usize,
    pub x_variable_name: Option<String>,
    pub y_variable_name: Option<String>,
    pub flip_horizontal_axis: bool,
}

impl ExplorerInfo {
    /// Default axes for an entry: `x`/`y` when present, else the first two
    /// variables.
    pub fn for_measurement(measurement: &Measurement, data_index: usize) -> Self {
        let (x, y) = measurement
            .data
            .get(data_index)
            .map(MeasurementData::default_axes)
            .unwrap_or((None, None));
        Self {
            data_index,
            x_variable_name: x.map(str::to_string),
            y_variable_name: y.map(str::to_string),
            flip_horizontal_axis: false,
        }
    }

    fn entry<'a>(&self, measurement: &'a Measurement) -> Option<&'a MeasurementData> {
        measurement.data.get(self.data_index)
    }

    /// Whether this selection still makes sense for `measurement`
    pub fn is_valid_for(&self, measurement: &Measurement) -> bool {
        let Some(entry) = self.entry(measurement) else {
            return measurement.data.is_empty() && self.data_index == 0;
        };
        [&self.x_variable_name, &self.y_variable_name]
            .into_iter()
            .flatten()
            .all(|name| entry.variables.contains_key(name))
    }

    /// Show another data entry; variables reset to its defaults, the flip
    /// setting is kept. Out of range indices are ignored.
    ///
    /// The defaults are taken from the newly selected entry rather than
    /// entry 0, so the index change sticks and the axes name variables
    /// that entry actually has.
    pub fn select_data_index(&mut self, measurement: &Measurement, data_index: usize) -> bool {
        if data_index >= measurement.data.len() {
            return false;
        }
        let flip = self.flip_horizontal_axis;
        *self = Self::for_measurement(measurement, data_index);
        self.flip_horizontal_axis = flip;
        true
    }

    /// Use `name` as abscissa unless it is the ordinate or unknown
    pub fn set_x_variable(&mut self, measurement: &Measurement, name: &str) -> bool {
        if self.y_variable_name.as_deref() == Some(name) || !self.has_variable(measurement, name) {
            return false;
        }
        self.x_variable_name = Some(name.to_string());
        true
    }

    /// Use `name` as ordinate unless it is the abscissa or unknown
    pub fn set_y_variable(&mut self, measurement: &Measurement, name: &str) -> bool {
        if self.x_variable_name.as_deref() == Some(name) || !self.has_variable(measurement, name) {
            return false;
        }
        self.y_variable_name = Some(name.to_string());
        true
    }

    fn has_variable(&self, measurement: &Measurement, name: &str) -> bool {
        self.entry(measurement)
            .is_some_and(|entry| entry.variables.contains_key(name))
    }

    pub fn swap_axes(&mut self) {
        std::mem::swap(&mut self.x_variable_name, &mut self.y_variable_name);
    }

    pub fn toggle_flip(&mut self) {
        self.flip_horizontal_axis = !self.flip_horizontal_axis;
    }

    /// Points and labels for the selected entry and axes
    pub fn plot_series(&self, measurement: &Measurement) -> Option<PlotSeries> {
        let entry = self.entry(measurement)?;
        let x_name = self.x_variable_name.as_deref()?;
        let y_name = self.y_variable_name.as_deref()?;
        let x = entry.variables.get(x_name)?;
        let y = entry.variables.get(y_name)?;
        Some(PlotSeries::from_variables(
            measurement.display_name(),
            (x_name, x),
            (y_name, y),
            self.flip_horizontal_axis,
        ))
    }
}

/// Explorer widget state, following the current measurement
#[derive(Debug, Default)]
pub struct ExplorerView {
    measurement_id: Option<String>,
    info: ExplorerInfo,
    cache: Option<(u64, ExplorerInfo, Option<PlotSeries>)>,
}

impl ExplorerView {
    pub fn info(&self) -> &ExplorerInfo {
        &self.info
    }

    /// Reset when the measurement changes or the selection no longer fits it
    pub fn sync(&mut self, measurement: Option<&Measurement>) {
        match measurement {
            Some(m) => {
                if self.measurement_id.as_deref() != Some(m.id.as_str()) || !self.info.is_valid_for(m) {
                    tracing::trace!(id = %m.id, "Explorer reset");
                    self.measurement_id = Some(m.id.clone());
                    self.info = ExplorerInfo::for_measurement(m, 0);
                    self.cache = None;
                }
            }
            None => {
                self.measurement_id = None;
                self.info = ExplorerInfo::default();
                self.cache = None;
            }
        }
    }

    /// Plot series, recomputed only when the store revision or the
    /// selection changed
    fn series(&mut self, measurement: &Measurement, revision: u64) -> Option<&PlotSeries> {
        let stale = match &self.cache {
            Some((rev, info, _)) => *rev != revision || *info != self.info,
            None => true,
        };
        if stale {
            let series = self.info.plot_series(measurement);
            self.cache = Some((revision, self.info.clone(), series));
        }
        self.cache.as_ref().and_then(|(_, _, series)| series.as_ref())
    }

    pub fn ui(&mut self, ui: &mut Ui, measurement: &Measurement, revision: u64) {
        self.sync(Some(measurement));

        ui.horizontal(|ui| {
            ui.heading(measurement.display_name());
            ui.label(format!("({})", measurement.kind));
        });

        ui.horizontal(|ui| {
            if measurement.data.len() > 1 {
                let mut index = self.info.data_index;
                egui::ComboBox::from_label("Entry")
                    .selected_text(format!("#{}", index + 1))
                    .show_ui(ui, |ui| {
                        for i in 0..measurement.data.len() {
                            ui.selectable_value(&mut index, i, format!("#{}", i + 1));
                        }
                    });
                if index != self.info.data_index {
                    self.info.select_data_index(measurement, index);
                }
            }

            let names: Vec<String> = measurement
                .data
                .get(self.info.data_index)
                .map(|entry| entry.variables.keys().cloned().collect())
                .unwrap_or_default();

            let mut x = self.info.x_variable_name.clone().unwrap_or_default();
            egui::ComboBox::from_label("X")
                .selected_text(x.as_str())
                .show_ui(ui, |ui| {
                    for name in &names {
                        ui.selectable_value(&mut x, name.clone(), name.as_str());
                    }
                });
            if self.info.x_variable_name.as_deref() != Some(x.as_str()) {
                self.info.set_x_variable(measurement, &x);
            }

            let mut y = self.info.y_variable_name.clone().unwrap_or_default();
            egui::ComboBox::from_label("Y")
                .selected_text(y.as_str())
                .show_ui(ui, |ui| {
                    for name in &names {
                        ui.selectable_value(&mut y, name.clone(), name.as_str());
                    }
                });
            if self.info.y_variable_name.as_deref() != Some(y.as_str()) {
                self.info.set_y_variable(measurement, &y);
            }

            if ui.button("⇄ Swap").clicked() {
                self.info.swap_axes();
            }

            let mut flip = self.info.flip_horizontal_axis;
            if ui.checkbox(&mut flip, "Flip horizontal axis").changed() {
                self.info.toggle_flip();
            }
        });

        ui.separator();

        let plot_id = format!("explorer_{}", measurement.id);
        match self.series(measurement, revision) {
            Some(series) if !series.points.is_empty() => series.render(ui, &plot_id),
            _ => {
                ui.centered_and_justified(|ui| {
                    ui.label("Nothing to plot for this entry");
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Variable, Variables};

    fn entry(names: &[&str]) -> MeasurementData {
        let variables: Variables = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), Variable::new(vec![i as f64, i as f64 + 1.0])))
            .collect();
        MeasurementData::new(variables)
    }

    fn measurement() -> Measurement {
        Measurement::new("m1", "ir")
            .with_data(entry(&["x", "y", "z"]))
            .with_data(entry(&["wavenumber", "absorbance"]))
    }

    #[test]
    fn test_defaults_follow_axis_convention() {
        let m = measurement();
        let info = ExplorerInfo::for_measurement(&m, 0);
        assert_eq!(info.x_variable_name.as_deref(), Some("x"));
        assert_eq!(info.y_variable_name.as_deref(), Some("y"));

        let info = ExplorerInfo::for_measurement(&m, 1);
        assert_eq!(info.x_variable_name.as_deref(), Some("wavenumber"));
        assert_eq!(info.y_variable_name.as_deref(), Some("absorbance"));
    }

    #[test]
    fn test_data_index_change_uses_selected_entry_and_keeps_flip() {
        let m = measurement();
        let mut info = ExplorerInfo::for_measurement(&m, 0);
        info.toggle_flip();

        assert!(info.select_data_index(&m, 1));
        assert_eq!(info.data_index, 1);
        assert_eq!(info.x_variable_name.as_deref(), Some("wavenumber"));
        assert!(info.flip_horizontal_axis);

        assert!(!info.select_data_index(&m, 5));
        assert_eq!(info.data_index, 1);
    }

    #[test]
    fn test_axes_never_share_a_variable() {
        let m = measurement();
        let mut info = ExplorerInfo::for_measurement(&m, 0);
        assert!(!info.set_x_variable(&m, "y"));
        assert!(!info.set_y_variable(&m, "x"));
        assert!(!info.set_y_variable(&m, "missing"));
        assert!(info.set_y_variable(&m, "z"));
        assert_eq!(info.y_variable_name.as_deref(), Some("z"));
    }

    #[test]
    fn test_swap_axes() {
        let m = measurement();
        let mut info = ExplorerInfo::for_measurement(&m, 0);
        info.swap_axes();
        assert_eq!(info.x_variable_name.as_deref(), Some("y"));
        assert_eq!(info.y_variable_name.as_deref(), Some("x"));

        let series = info.plot_series(&m).unwrap();
        assert_eq!(series.points, vec![[1.0, 0.0], [2.0, 1.0]]);
    }

    #[test]
    fn test_plot_series_requires_both_axes() {
        let m = Measurement::new("single", "ir").with_data(entry(&["only"]));
        let info = ExplorerInfo::for_measurement(&m, 0);
        assert_eq!(info.y_variable_name, None);
        assert!(info.plot_series(&m).is_none());

        let empty = Measurement::new("empty", "ir");
        assert!(ExplorerInfo::for_measurement(&empty, 0).plot_series(&empty).is_none());
    }

    #[test]
    fn test_view_resets_on_measurement_change() {
        let first = measurement();
        let second = Measurement::new("m2", "ir").with_data(entry(&["a", "b"]));
        let mut view = ExplorerView::default();

        view.sync(Some(&first));
        assert!(view.info.select_data_index(&first, 1));
        view.sync(Some(&first));
        assert_eq!(view.info().data_index, 1);

        view.sync(Some(&second));
        assert_eq!(view.info().data_index, 0);
        assert_eq!(view.info().x_variable_name.as_deref(), Some("a"));

        view.sync(None);
        assert_eq!(view.info(), &ExplorerInfo::default());
    }

    #[test]
    fn test_view_resets_when_replaced_data_drops_variable() {
        let mut view = ExplorerView::default();
        view.sync(Some(&measurement()));
        assert!(view.info.set_y_variable(&measurement(), "z"));

        let replaced = Measurement::new("m1", "ir").with_data(entry(&["x", "y"]));
        view.sync(Some(&replaced));
        assert_eq!(view.info().y_variable_name.as_deref(), Some("y"));
    }

    #[test]
    fn test_series_cache_follows_revision_and_selection() {
        let m = measurement();
        let mut view = ExplorerView::default();
        view.sync(Some(&m));

        let first = view.series(&m, 1).cloned();
        assert!(first.is_some());
        view.info.swap_axes();
        let swapped = view.series(&m, 1).cloned();
        assert_ne!(first, swapped);
    }
}
