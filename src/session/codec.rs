//! `.ium` session document codec
//!
//! Document layout:
//!
//! ```json
//! {
//!   "version": 1,
//!   "savedAt": "2024-05-01T10:00:00Z",
//!   "data": { "measurements": { "ir": { "entries": [ ... ] } } },
//!   "view": { "currentMeasurementKind": "ir", "currentMeasurement": "m1" }
//! }
//! ```
//!
//! Typed numeric buffers are written as number arrays by the [`numeric`]
//! serde codec and read back as `f64` arrays. Non-finite values are written
//! as strings (see [`float`]). Documents without a `version` field are read
//! as version 1.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};
use crate::store::{AppState, DataState, ViewState};

/// Current session format version
pub const SESSION_FORMAT_VERSION: u32 = 1;

/// Serde codec for a single `f64` that keeps non-finite values
///
/// Finite values are plain JSON numbers. NaN and the infinities are written
/// as the strings `"NaN"`, `"Infinity"` and `"-Infinity"`. `null` reads
/// back as NaN.
pub mod float {
    use std::fmt;

    use serde::de::{self, Deserializer, Unexpected, Visitor};
    use serde::{Deserialize, Serialize, Serializer};

    pub const NAN: &str = "NaN";
    pub const INFINITY: &str = "Infinity";
    pub const NEG_INFINITY: &str = "-Infinity";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str(NAN)
        } else if value.is_sign_positive() {
            serializer.serialize_str(INFINITY)
        } else {
            serializer.serialize_str(NEG_INFINITY)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(FloatVisitor)
    }

    struct FloatVisitor;

    impl<'de> Visitor<'de> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number, null, \"NaN\", \"Infinity\" or \"-Infinity\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
            Ok(f64::NAN)
        }

        fn visit_none<E: de::Error>(self) -> Result<f64, E> {
            Ok(f64::NAN)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
            }
        }
    }

    /// One element of a numeric array
    pub(super) struct Float(pub f64);

    impl Serialize for Float {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serialize(&self.0, serializer)
        }
    }

    impl<'de> Deserialize<'de> for Float {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserialize(deserializer).map(Float)
        }
    }

    /// Same encoding for optional fields; `null` or a missing field is `None`
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::Float;

        pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
            Ok(Option::<Float>::deserialize(deserializer)?.map(|f| f.0))
        }
    }
}

/// Serde codec between [`NumericArray`](crate::types::NumericArray) and a
/// JSON number array
///
/// Elements use the [`float`] encoding, so non-finite values survive a
/// round trip.
pub mod numeric {
    use serde::de::Deserializer;
    use serde::ser::{SerializeSeq, Serializer};
    use serde::Deserialize;

    use super::float::Float;
    use crate::types::NumericArray;

    pub fn serialize<S: Serializer>(data: &NumericArray, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(data.len()))?;
        for value in data.iter() {
            seq.serialize_element(&Float(value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NumericArray, D::Error> {
        let values = Vec::<Float>::deserialize(deserializer)?;
        Ok(NumericArray::Float64(values.into_iter().map(|f| f.0).collect()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionDocumentRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    data: &'a DataState,
    view: &'a ViewState,
}

/// A decoded session document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: DataState,
    #[serde(default)]
    pub view: ViewState,
}

fn default_version() -> u32 {
    1
}

impl SessionDocument {
    pub fn into_state(self) -> AppState {
        AppState {
            data: self.data,
            view: self.view,
        }
    }
}

/// Encode a state as a session blob
///
/// `indent == 0` writes compact JSON; otherwise the document is
/// pretty-printed with `indent` spaces per level.
pub fn encode(state: &AppState, indent: usize) -> Result<Vec<u8>> {
    let document = SessionDocumentRef {
        version: SESSION_FORMAT_VERSION,
        saved_at: Utc::now(),
        data: &state.data,
        view: &state.view,
    };

    let mut out = Vec::new();
    if indent == 0 {
        serde_json::to_writer(&mut out, &document)?;
    } else {
        let indent = vec![b' '; indent];
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        document.serialize(&mut serializer)?;
    }
    Ok(out)
}

/// Decode a session blob, keeping the document metadata
pub fn decode_document(bytes: &[u8]) -> Result<SessionDocument> {
    let document: SessionDocument = serde_json::from_slice(bytes)
        .map_err(|e| ViewerError::Session(format!("Failed to parse session: {}", e)))?;

    if document.version > SESSION_FORMAT_VERSION {
        return Err(ViewerError::Session(format!(
            "Unsupported session version {} (newest supported is {})",
            document.version, SESSION_FORMAT_VERSION
        )));
    }

    Ok(document)
}

/// Decode a session blob into a state
pub fn decode(bytes: &[u8]) -> Result<AppState> {
    decode_document(bytes).map(SessionDocument::into_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{reduce, Action};
    use crate::types::{IrPeak, Measurement, MeasurementData, NumericArray, Variable, Variables};

    fn sample_state() -> AppState {
        let variables = Variables::from_iter([
            ("x".to_string(), Variable::new(vec![4000.0, 3000.0, 2000.0]).with_units("cm-1")),
            ("y".to_string(), Variable::new(vec![0.9, 0.5, 0.7])),
        ]);
        let peak = IrPeak {
            wavenumber: 3000.0,
            transmittance: Some(0.5),
            absorbance: None,
            kind: "m".to_string(),
        };
        let ir = Measurement::new("ir-1", "ir")
            .with_data(MeasurementData::new(variables).with_peaks(vec![peak]));
        let state = reduce(
            AppState::default(),
            Action::load_files(vec![ir, Measurement::new("h-1", "1h")]),
        );
        reduce(state, Action::select_kind("ir"))
    }

    #[test]
    fn test_round_trip() {
        let state = sample_state();
        let bytes = encode(&state, 0).unwrap();
        assert_eq!(decode(&bytes).unwrap(), state);
    }

    #[test]
    fn test_indent_has_no_semantic_effect() {
        let state = sample_state();
        let compact = encode(&state, 0).unwrap();
        let pretty = encode(&state, 2).unwrap();
        assert!(pretty.len() > compact.len());
        assert!(String::from_utf8(pretty.clone()).unwrap().contains("\n  \"version\""));
        assert_eq!(decode(&compact).unwrap(), decode(&pretty).unwrap());
    }

    #[test]
    fn test_typed_buffers_become_f64_arrays() {
        let variables = Variables::from_iter([("x".to_string(), Variable::new(vec![1i32, 2, 3]))]);
        let state = reduce(
            AppState::default(),
            Action::load_files(vec![Measurement::new("m", "ir").with_data(MeasurementData::new(variables))]),
        );
        let bytes = encode(&state, 0).unwrap();
        assert!(String::from_utf8(bytes.clone()).unwrap().contains("\"data\":[1.0,2.0,3.0]"));

        let decoded = decode(&bytes).unwrap();
        let m = &decoded.data.measurements.get("ir").unwrap().entries[0];
        assert_eq!(
            m.data[0].variables.get("x").unwrap().data,
            NumericArray::Float64(vec![1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn test_document_without_version_loads() {
        let json = br#"{"data": {"measurements": {"1h": {"entries": [{"id": "m1", "kind": "1h", "data": []}]}}},
                        "view": {"currentMeasurementKind": "1h", "currentMeasurement": "m1"}}"#;
        let document = decode_document(json).unwrap();
        assert_eq!(document.version, 1);
        assert!(document.saved_at.is_none());
        let state = document.into_state();
        assert_eq!(state.view.current_measurement.as_deref(), Some("m1"));
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let json = br#"{"version": 99, "data": {}, "view": {}}"#;
        let err = decode(json).unwrap_err();
        assert!(err.to_string().contains("Unsupported session version 99"));
    }

    #[test]
    fn test_null_reads_as_nan() {
        let json = br#"{"data": {"measurements": {"ir": {"entries": [
            {"id": "m", "kind": "ir", "data": [{"variables": {"y": {"data": [1, null]}}}]}
        ]}}}}"#;
        let state = decode(json).unwrap();
        let y = &state.data.measurements.get("ir").unwrap().entries[0].data[0]
            .variables
            .get("y")
            .unwrap()
            .data;
        assert!(y.get(1).unwrap().is_nan());
    }

    #[test]
    fn test_non_finite_values_round_trip() {
        let variables = Variables::from_iter([(
            "x".to_string(),
            Variable::new(vec![1.0, f64::INFINITY, f64::NEG_INFINITY, f64::NAN]),
        )]);
        let peak = IrPeak {
            wavenumber: f64::NAN,
            transmittance: Some(f64::INFINITY),
            absorbance: None,
            kind: String::new(),
        };
        let state = reduce(
            AppState::default(),
            Action::load_files(vec![Measurement::new("m", "ir")
                .with_data(MeasurementData::new(variables).with_peaks(vec![peak]))]),
        );

        let bytes = encode(&state, 0).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains(r#"[1.0,"Infinity","-Infinity","NaN"]"#));

        let decoded = decode(&bytes).unwrap();
        let entry = &decoded.data.measurements.get("ir").unwrap().entries[0].data[0];
        let x = &entry.variables.get("x").unwrap().data;
        assert_eq!(x.get(1), Some(f64::INFINITY));
        assert_eq!(x.get(2), Some(f64::NEG_INFINITY));
        assert!(x.get(3).unwrap().is_nan());

        let peak = &entry.peaks.as_ref().unwrap()[0];
        assert!(peak.wavenumber.is_nan());
        assert_eq!(peak.transmittance, Some(f64::INFINITY));
        assert_eq!(peak.absorbance, None);
    }

    #[test]
    fn test_unknown_float_string_is_session_error() {
        let json = br#"{"data": {"measurements": {"ir": {"entries": [
            {"id": "m", "kind": "ir", "data": [{"variables": {"y": ["many"]}}]}
        ]}}}}"#;
        assert!(matches!(decode(json), Err(ViewerError::Session(_))));
    }

    #[test]
    fn test_garbage_is_session_error() {
        assert!(matches!(decode(b"not json"), Err(ViewerError::Session(_))));
    }
}
