//! Core data types for the measurement viewer
//!
//! This module contains the measurement data model shared by the store, the
//! loaders, the session codec and the views.
//!
//! # Main Types
//!
//! - [`Measurement`] - A named, typed dataset with one or more data entries
//! - [`MeasurementData`] - One entry: named variable series and optional peaks
//! - [`Variable`] - A numeric series with optional label and units
//! - [`NumericArray`] - Typed numeric buffer produced by parsers
//! - [`IrPeak`] - A detected IR peak
//!
//! # Axis Convention
//!
//! Variables are keyed by arbitrary names. Views pick the abscissa as `"x"`
//! when present, otherwise the first variable; the ordinate as `"y"` when
//! present, otherwise the first other variable (see
//! [`MeasurementData::default_axes`]).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::session::codec::{float, numeric};

/// Maximum number of points to render per line for performance
pub const MAX_RENDER_POINTS: usize = 2000;

// ==================== Numeric Data ====================

/// Typed numeric buffer
///
/// Parsers keep whatever representation the source format uses. The
/// session codec writes every representation as a plain number array and
/// reads it back as [`NumericArray::Float64`].
#[derive(Debug, Clone, PartialEq)]
pub enum NumericArray {
    Float64(Vec<f64>),
    Float32(Vec<f32>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
}

impl Default for NumericArray {
    fn default() -> Self {
        NumericArray::Float64(Vec::new())
    }
}

impl NumericArray {
    pub fn len(&self) -> usize {
        match self {
            NumericArray::Float64(v) => v.len(),
            NumericArray::Float32(v) => v.len(),
            NumericArray::Int32(v) => v.len(),
            NumericArray::Uint32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index` widened to f64
    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            NumericArray::Float64(v) => v.get(index).copied(),
            NumericArray::Float32(v) => v.get(index).map(|&x| f64::from(x)),
            NumericArray::Int32(v) => v.get(index).map(|&x| f64::from(x)),
            NumericArray::Uint32(v) => v.get(index).map(|&x| f64::from(x)),
        }
    }

    /// Iterate all values widened to f64
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Copy into a plain f64 vector
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            NumericArray::Float64(v) => v.clone(),
            _ => self.iter().collect(),
        }
    }

    /// Short name of the in-memory representation
    pub fn type_name(&self) -> &'static str {
        match self {
            NumericArray::Float64(_) => "f64",
            NumericArray::Float32(_) => "f32",
            NumericArray::Int32(_) => "i32",
            NumericArray::Uint32(_) => "u32",
        }
    }
}

impl From<Vec<f64>> for NumericArray {
    fn from(values: Vec<f64>) -> Self {
        NumericArray::Float64(values)
    }
}

impl From<Vec<f32>> for NumericArray {
    fn from(values: Vec<f32>) -> Self {
        NumericArray::Float32(values)
    }
}

impl From<Vec<i32>> for NumericArray {
    fn from(values: Vec<i32>) -> Self {
        NumericArray::Int32(values)
    }
}

/// A named numeric series inside a measurement entry
///
/// Accepts either a bare number array or `{ data, label?, units? }` when
/// deserializing; always serializes the object form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "VariableRepr")]
pub struct Variable {
    #[serde(serialize_with = "numeric::serialize")]
    pub data: NumericArray,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VariableRepr {
    Plain(#[serde(deserialize_with = "numeric::deserialize")] NumericArray),
    Full {
        #[serde(deserialize_with = "numeric::deserialize")]
        data: NumericArray,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        units: Option<String>,
    },
}

impl From<VariableRepr> for Variable {
    fn from(repr: VariableRepr) -> Self {
        match repr {
            VariableRepr::Plain(data) => Variable {
                data,
                label: None,
                units: None,
            },
            VariableRepr::Full { data, label, units } => Variable { data, label, units },
        }
    }
}

impl Variable {
    pub fn new(data: impl Into<NumericArray>) -> Self {
        Self {
            data: data.into(),
            label: None,
            units: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Axis title: label (or the variable name) with units in brackets
    pub fn axis_title(&self, name: &str) -> String {
        let label = self.label.as_deref().unwrap_or(name);
        match &self.units {
            Some(units) if !units.is_empty() => format!("{} [{}]", label, units),
            _ => label.to_string(),
        }
    }
}

/// Variables of one measurement entry, keyed by name
pub type Variables = IndexMap<String, Variable>;

// ==================== Peaks ====================

/// A detected peak in an IR spectrum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrPeak {
    #[serde(with = "float")]
    pub wavenumber: f64,
    #[serde(default, with = "float::option", skip_serializing_if = "Option::is_none")]
    pub transmittance: Option<f64>,
    #[serde(default, with = "float::option", skip_serializing_if = "Option::is_none")]
    pub absorbance: Option<f64>,
    #[serde(default)]
    pub kind: String,
}

impl IrPeak {
    /// Formatted value of a field addressed by its JSON path
    ///
    /// Returns `None` for unset optional fields and unknown paths.
    pub fn display_field(&self, jpath: &str) -> Option<String> {
        match jpath {
            "wavenumber" => Some(format!("{:.2}", self.wavenumber)),
            "transmittance" => self.transmittance.map(|v| format!("{:.4}", v)),
            "absorbance" => self.absorbance.map(|v| format!("{:.4}", v)),
            "kind" if !self.kind.is_empty() => Some(self.kind.clone()),
            _ => None,
        }
    }
}

// ==================== Measurements ====================

/// One data entry of a measurement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementData {
    #[serde(default)]
    pub variables: Variables,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peaks: Option<Vec<IrPeak>>,
}

impl MeasurementData {
    pub fn new(variables: Variables) -> Self {
        Self {
            variables,
            peaks: None,
        }
    }

    pub fn with_peaks(mut self, peaks: Vec<IrPeak>) -> Self {
        self.peaks = Some(peaks);
        self
    }

    /// Default abscissa and ordinate variable names
    ///
    /// `"x"` if present, else the first variable; `"y"` if present and
    /// distinct from the abscissa, else the first other variable.
    pub fn default_axes(&self) -> (Option<&str>, Option<&str>) {
        let x = if self.variables.contains_key("x") {
            Some("x")
        } else {
            self.variables.keys().next().map(String::as_str)
        };
        let y = if self.variables.contains_key("y") && x != Some("y") {
            Some("y")
        } else {
            self.variables
                .keys()
                .map(String::as_str)
                .find(|k| Some(*k) != x)
        };
        (x, y)
    }

    /// Number of points in the longest variable
    pub fn point_count(&self) -> usize {
        self.variables.values().map(|v| v.data.len()).max().unwrap_or(0)
    }
}

/// A named, typed scientific dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub data: Vec<MeasurementData>,
}

impl Measurement {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            title: None,
            data: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_data(mut self, data: MeasurementData) -> Self {
        self.data.push(data);
        self
    }

    /// Name shown in lists: the title, or the id when untitled
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    /// Peaks of a data entry, empty when none were detected
    pub fn peaks(&self, data_index: usize) -> &[IrPeak] {
        self.data
            .get(data_index)
            .and_then(|d| d.peaks.as_deref())
            .unwrap_or(&[])
    }
}
