//! Display preferences
//!
//! # Main Types
//!
//! - [`PeaksTablePreferences`] - Which IR peak fields the peaks table shows
//! - [`PeakColumn`] - One table column, addressed by a JSON path
//! - [`UiPreferences`] - Theme and scaling

use serde::{Deserialize, Serialize};

/// One column of the IR peaks table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakColumn {
    /// Field path inside a peak (`wavenumber`, `transmittance`, ...)
    pub jpath: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    pub label: String,
}

impl PeakColumn {
    pub fn new(jpath: &str, label: &str) -> Self {
        Self {
            jpath: jpath.to_string(),
            visible: true,
            label: label.to_string(),
        }
    }
}

/// Column configuration of the IR peaks table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeaksTablePreferences {
    #[serde(default = "default_peak_columns")]
    pub columns: Vec<PeakColumn>,
}

fn default_peak_columns() -> Vec<PeakColumn> {
    vec![
        PeakColumn::new("wavenumber", "Wavenumber"),
        PeakColumn::new("transmittance", "Transmittance"),
        PeakColumn::new("absorbance", "Absorbance"),
        PeakColumn::new("kind", "Kind"),
    ]
}

impl Default for PeaksTablePreferences {
    fn default() -> Self {
        Self {
            columns: default_peak_columns(),
        }
    }
}

impl PeaksTablePreferences {
    pub fn visible_columns(&self) -> impl Iterator<Item = &PeakColumn> {
        self.columns.iter().filter(|c| c.visible)
    }
}

/// UI preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiPreferences {
    /// Enable dark mode
    #[serde(default = "default_true")]
    pub dark_mode: bool,

    /// Font scale factor
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
}

fn default_true() -> bool {
    true
}

fn default_font_scale() -> f32 {
    1.0
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            font_scale: 1.0,
        }
    }
}
