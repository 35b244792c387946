//! Measurement parsers
//!
//! A [`MeasurementParser`] turns one [`FileItem`] into zero or more
//! measurements, plus the saved selection when the file is a session. The
//! [`ParserRegistry`] asks each registered parser in order whether it
//! supports a file and uses the first match.

use serde_json::Value;

use super::FileItem;
use crate::config::LoaderConfig;
use crate::error::{Result, ViewerError};
use crate::session::{self, SESSION_FILE_EXTENSION};
use crate::store::{MeasurementGroup, ViewState};
use indexmap::IndexMap;

use crate::types::{Measurement, MeasurementData, Variable, Variables};

/// What one file contributed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    pub measurements: Vec<Measurement>,
    /// Selection stored in a saved session
    pub view: Option<ViewState>,
}

impl From<Vec<Measurement>> for ParsedFile {
    fn from(measurements: Vec<Measurement>) -> Self {
        Self {
            measurements,
            view: None,
        }
    }
}

/// Converts raw files into measurements
#[cfg_attr(test, mockall::automock)]
pub trait MeasurementParser: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether this parser handles the file
    fn supports(&self, file: &FileItem) -> bool;

    /// Parse a supported file
    fn parse(&self, file: &FileItem) -> Result<ParsedFile>;
}

/// Ordered set of parsers
#[derive(Default)]
pub struct ParserRegistry {
    parsers: Vec<Box<dyn MeasurementParser>>,
}

impl ParserRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in JSON, session and delimited text parsers
    pub fn with_defaults(config: &LoaderConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(JsonMeasurementParser));
        registry.register(Box::new(SessionFileParser));
        registry.register(Box::new(DelimitedTextParser::new(&config.default_text_kind)));
        registry
    }

    pub fn register(&mut self, parser: Box<dyn MeasurementParser>) {
        self.parsers.push(parser);
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Parse with the first parser that supports the file
    pub fn parse(&self, file: &FileItem) -> Result<ParsedFile> {
        let parser = self
            .parsers
            .iter()
            .find(|p| p.supports(file))
            .ok_or_else(|| ViewerError::UnsupportedFile(file.relative_path.clone()))?;

        tracing::trace!(file = %file.relative_path, parser = parser.name(), "Parsing");
        parser.parse(file)
    }
}

// ==================== JSON ====================

/// Measurement JSON documents
///
/// Accepts a single measurement object, an array of them, or a grouped
/// document `{"measurements": {kind: {"entries": [...]}}}`. Missing ids are
/// derived from the file path; missing kinds are taken from the group key.
pub struct JsonMeasurementParser;

impl MeasurementParser for JsonMeasurementParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn supports(&self, file: &FileItem) -> bool {
        file.extension().as_deref() == Some("json")
    }

    fn parse(&self, file: &FileItem) -> Result<ParsedFile> {
        let path = file.relative_path.as_str();
        let value: Value =
            serde_json::from_slice(&file.bytes).map_err(|e| ViewerError::parse(path, e))?;

        let mut measurements = match value {
            Value::Object(ref object) if object.contains_key("measurements") => {
                let groups: IndexMap<String, MeasurementGroup> =
                    serde_json::from_value(object["measurements"].clone())
                        .map_err(|e| ViewerError::parse(path, e))?;
                groups
                    .into_iter()
                    .flat_map(|(kind, group)| {
                        group.entries.into_iter().map(move |mut m| {
                            if m.kind.is_empty() {
                                m.kind = kind.clone();
                            }
                            m
                        })
                    })
                    .collect()
            }
            Value::Array(_) => serde_json::from_value::<Vec<Measurement>>(value)
                .map_err(|e| ViewerError::parse(path, e))?,
            Value::Object(_) => vec![serde_json::from_value::<Measurement>(value)
                .map_err(|e| ViewerError::parse(path, e))?],
            _ => return Err(ViewerError::parse(path, "expected a JSON object or array")),
        };

        let single = measurements.len() == 1;
        for (index, m) in measurements.iter_mut().enumerate() {
            if m.kind.trim().is_empty() {
                return Err(ViewerError::parse(
                    path,
                    format!("measurement {} has no kind", index),
                ));
            }
            if m.id.is_empty() {
                m.id = if single {
                    path.to_string()
                } else {
                    format!("{}#{}", path, index)
                };
            }
        }
        Ok(measurements.into())
    }
}

// ==================== Session ====================

/// Saved `.ium` sessions; yields the measurements and the saved selection
pub struct SessionFileParser;

impl MeasurementParser for SessionFileParser {
    fn name(&self) -> &'static str {
        "session"
    }

    fn supports(&self, file: &FileItem) -> bool {
        file.extension().as_deref() == Some(SESSION_FILE_EXTENSION)
    }

    fn parse(&self, file: &FileItem) -> Result<ParsedFile> {
        let state = session::decode(&file.bytes)
            .map_err(|e| ViewerError::parse(&file.relative_path, e))?;
        Ok(ParsedFile {
            measurements: state
                .data
                .measurements
                .into_iter()
                .flat_map(|(_, group)| group.entries)
                .collect(),
            view: Some(state.view),
        })
    }
}

// ==================== Delimited Text ====================

/// Numeric columns in CSV, TSV or whitespace separated text
///
/// Lines starting with `#` and blank lines are ignored. The first remaining
/// record is a header when any of its fields is not a number. Columns are
/// named from the header, else `x`, `y`, `c3`, `c4`, ...; a name that is
/// missing or already taken falls back to the first free `c<column>`.
pub struct DelimitedTextParser {
    kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Delimiter {
    Byte(u8),
    Whitespace,
}

impl Delimiter {
    /// Pick the delimiter from the first data line
    fn detect(text: &str) -> Self {
        let first = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .unwrap_or_default();
        [b'\t', b',', b';']
            .into_iter()
            .find(|b| first.as_bytes().contains(b))
            .map_or(Delimiter::Whitespace, Delimiter::Byte)
    }

    fn reader<'a>(self, text: &'a str) -> csv::Reader<&'a [u8]> {
        let byte = match self {
            Delimiter::Byte(b) => b,
            Delimiter::Whitespace => b' ',
        };
        csv::ReaderBuilder::new()
            .delimiter(byte)
            .comment(Some(b'#'))
            .flexible(true)
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes())
    }

    /// Fields of a record; runs of spaces count as one separator
    fn fields(self, record: &csv::StringRecord) -> Vec<String> {
        match self {
            Delimiter::Byte(_) => record.iter().map(str::to_string).collect(),
            Delimiter::Whitespace => record
                .iter()
                .flat_map(str::split_whitespace)
                .map(str::to_string)
                .collect(),
        }
    }
}

fn default_column_name(index: usize) -> String {
    match index {
        0 => "x".to_string(),
        1 => "y".to_string(),
        n => format!("c{}", n + 1),
    }
}

fn unused_column_name(taken: &[String], index: usize) -> String {
    let preferred = default_column_name(index);
    if !taken.contains(&preferred) {
        return preferred;
    }
    let mut n = index + 1;
    loop {
        let name = format!("c{}", n);
        if !taken.contains(&name) {
            return name;
        }
        n += 1;
    }
}

impl DelimitedTextParser {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }

    fn column_names(header: Option<&[String]>, columns: usize) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(columns);
        for index in 0..columns {
            let candidate = header
                .and_then(|h| h.get(index))
                .map(|s| s.trim())
                .filter(|s| !s.is_empty());
            let name = match candidate {
                Some(name) if !names.iter().any(|n| n == name) => name.to_string(),
                _ => unused_column_name(&names, index),
            };
            names.push(name);
        }
        names
    }
}

impl MeasurementParser for DelimitedTextParser {
    fn name(&self) -> &'static str {
        "delimited"
    }

    fn supports(&self, file: &FileItem) -> bool {
        matches!(file.extension().as_deref(), Some("csv" | "tsv" | "txt"))
    }

    fn parse(&self, file: &FileItem) -> Result<ParsedFile> {
        let path = file.relative_path.as_str();
        let text = file.text()?;
        let delimiter = Delimiter::detect(text);
        let mut reader = delimiter.reader(text);

        let mut header: Option<Vec<String>> = None;
        let mut columns: Vec<Vec<f64>> = Vec::new();
        let mut first = true;

        for record in reader.records() {
            let record = record.map_err(|e| ViewerError::parse(path, e))?;
            let line_number = record.position().map_or(0, |p| p.line());
            let fields = delimiter.fields(&record);
            if fields.iter().all(String::is_empty) {
                continue;
            }

            if std::mem::take(&mut first) && fields.iter().any(|f| f.parse::<f64>().is_err()) {
                header = Some(fields);
                continue;
            }

            if columns.is_empty() {
                columns = vec![Vec::new(); fields.len()];
            } else if fields.len() != columns.len() {
                return Err(ViewerError::parse(
                    path,
                    format!(
                        "line {}: expected {} columns, found {}",
                        line_number,
                        columns.len(),
                        fields.len()
                    ),
                ));
            }
            for (column, field) in columns.iter_mut().zip(&fields) {
                let value = field.parse::<f64>().map_err(|_| {
                    ViewerError::parse(path, format!("line {}: invalid number {:?}", line_number, field))
                })?;
                column.push(value);
            }
        }

        if columns.is_empty() {
            return Err(ViewerError::parse(path, "no data rows"));
        }

        let names = Self::column_names(header.as_deref(), columns.len());
        let variables: Variables = names
            .into_iter()
            .zip(columns)
            .map(|(name, values)| (name, Variable::new(values)))
            .collect();

        Ok(vec![Measurement::new(path, self.kind.clone())
            .with_title(file.stem())
            .with_data(MeasurementData::new(variables))]
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Action, AppState};
    use crate::types::NumericArray;

    fn file(path: &str, content: &str) -> FileItem {
        FileItem::new(path, content.as_bytes().to_vec())
    }

    #[test]
    fn test_registry_reports_unsupported_files() {
        let registry = ParserRegistry::with_defaults(&LoaderConfig::default());
        assert_eq!(registry.len(), 3);
        let err = registry.parse(&file("image.png", "")).unwrap_err();
        assert!(matches!(err, ViewerError::UnsupportedFile(p) if p == "image.png"));
    }

    #[test]
    fn test_registry_uses_first_supporting_parser() {
        let mut first = MockMeasurementParser::new();
        first.expect_supports().return_const(true);
        first.expect_name().return_const("first");
        first
            .expect_parse()
            .times(1)
            .returning(|_| Ok(vec![Measurement::new("from-first", "ir")].into()));

        let mut second = MockMeasurementParser::new();
        second.expect_supports().never();
        second.expect_parse().never();

        let mut registry = ParserRegistry::new();
        registry.register(Box::new(first));
        registry.register(Box::new(second));

        let parsed = registry.parse(&file("a.any", "")).unwrap();
        assert_eq!(parsed.measurements[0].id, "from-first");
        assert!(parsed.view.is_none());
    }

    #[test]
    fn test_json_single_measurement_gets_path_id() {
        let json = r#"{"kind": "ir", "data": [{"variables": {"x": [1, 2], "y": [3, 4]}}]}"#;
        let parsed = JsonMeasurementParser
            .parse(&file("ir/ethanol.json", json))
            .unwrap()
            .measurements;
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "ir/ethanol.json");
        assert_eq!(parsed[0].data[0].point_count(), 2);
    }

    #[test]
    fn test_json_array_ids_are_indexed() {
        let json = r#"[{"kind": "1h"}, {"id": "keep", "kind": "13c"}, {"kind": "1h"}]"#;
        let parsed = JsonMeasurementParser.parse(&file("batch.json", json)).unwrap().measurements;
        let ids: Vec<_> = parsed.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["batch.json#0", "keep", "batch.json#2"]);
    }

    #[test]
    fn test_json_grouped_document_takes_kind_from_key() {
        let json = r#"{"measurements": {"ir": {"entries": [
            {"id": "m1", "data": [{"variables": {"x": [1], "y": [2]},
              "peaks": [{"wavenumber": 1715.2, "transmittance": 0.3, "kind": "s"}]}]}
        ]}}}"#;
        let parsed = JsonMeasurementParser.parse(&file("ir.json", json)).unwrap().measurements;
        assert_eq!(parsed[0].kind, "ir");
        assert_eq!(parsed[0].peaks(0).len(), 1);
    }

    #[test]
    fn test_json_without_kind_is_rejected() {
        let err = JsonMeasurementParser
            .parse(&file("bad.json", r#"{"id": "m1"}"#))
            .unwrap_err();
        assert!(err.to_string().contains("no kind"));

        assert!(JsonMeasurementParser.parse(&file("bad.json", "{not json")).is_err());
        assert!(JsonMeasurementParser.parse(&file("bad.json", "42")).is_err());
    }

    #[test]
    fn test_csv_with_header() {
        let csv = "# exported\nwavenumber,transmittance\n4000,0.98\n3999.5,0.97\n";
        let parsed = DelimitedTextParser::new("ir")
            .parse(&file("ethanol.csv", csv))
            .unwrap()
            .measurements;
        let m = &parsed[0];
        assert_eq!(m.kind, "ir");
        assert_eq!(m.title.as_deref(), Some("ethanol"));
        let vars = &m.data[0].variables;
        assert_eq!(vars.keys().collect::<Vec<_>>(), vec!["wavenumber", "transmittance"]);
        assert_eq!(
            vars.get("transmittance").unwrap().data,
            NumericArray::Float64(vec![0.98, 0.97])
        );
    }

    #[test]
    fn test_whitespace_text_without_header() {
        let txt = "1 10 100\n2 20 200\n";
        let parsed = DelimitedTextParser::new("generic")
            .parse(&file("run.txt", txt))
            .unwrap()
            .measurements;
        let vars = &parsed[0].data[0].variables;
        assert_eq!(vars.keys().collect::<Vec<_>>(), vec!["x", "y", "c3"]);
    }

    #[test]
    fn test_tsv_duplicate_header_names_fall_back() {
        let tsv = "a\ta\n1\t2\n";
        let parsed = DelimitedTextParser::new("generic")
            .parse(&file("d.tsv", tsv))
            .unwrap()
            .measurements;
        let vars = &parsed[0].data[0].variables;
        assert_eq!(vars.keys().collect::<Vec<_>>(), vec!["a", "y"]);
    }

    #[test]
    fn test_repeated_header_names_keep_every_column() {
        let parser = DelimitedTextParser::new("generic");

        let parsed = parser.parse(&file("d.csv", "y,y\n1,2\n3,4\n")).unwrap().measurements;
        let vars = &parsed[0].data[0].variables;
        assert_eq!(vars.keys().collect::<Vec<_>>(), vec!["y", "c2"]);
        assert_eq!(vars.get("c2").unwrap().data, NumericArray::Float64(vec![2.0, 4.0]));

        let parsed = parser.parse(&file("d.csv", "c3,x,c3\n1,2,3\n")).unwrap().measurements;
        let vars = &parsed[0].data[0].variables;
        assert_eq!(vars.keys().collect::<Vec<_>>(), vec!["c3", "x", "c4"]);
    }

    #[test]
    fn test_quoted_header_fields() {
        let csv = "\"wave, number\",\"signal\"\n1,2\n";
        let parsed = DelimitedTextParser::new("ir")
            .parse(&file("q.csv", csv))
            .unwrap()
            .measurements;
        let vars = &parsed[0].data[0].variables;
        assert_eq!(vars.keys().collect::<Vec<_>>(), vec!["wave, number", "signal"]);
    }

    #[test]
    fn test_whitespace_runs_and_semicolons() {
        let parser = DelimitedTextParser::new("generic");
        let parsed = parser.parse(&file("run.txt", "  1   10\n  2 20\n")).unwrap().measurements;
        assert_eq!(
            parsed[0].data[0].variables.get("y").unwrap().data,
            NumericArray::Float64(vec![10.0, 20.0])
        );

        let parsed = parser.parse(&file("eu.csv", "t;v\n1;2\n")).unwrap().measurements;
        assert_eq!(parsed[0].data[0].variables.keys().collect::<Vec<_>>(), vec!["t", "v"]);
    }

    #[test]
    fn test_malformed_rows_are_errors() {
        let parser = DelimitedTextParser::new("generic");
        let err = parser.parse(&file("bad.csv", "1,2\n3\n")).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(parser.parse(&file("bad.csv", "1,2\n3,abc\n")).is_err());
        assert!(parser.parse(&file("empty.csv", "# nothing\n\n")).is_err());
        assert!(parser.parse(&file("header-only.csv", "x,y\n")).is_err());
    }

    #[test]
    fn test_session_file_yields_measurements() {
        let state = crate::store::reduce(
            AppState::default(),
            Action::load_files(vec![Measurement::new("a", "ir"), Measurement::new("b", "1h")]),
        );
        let state = crate::store::reduce(state, Action::select_measurement("b", "1h"));
        let bytes = session::encode(&state, 0).unwrap();
        let parsed = SessionFileParser
            .parse(&FileItem::new("file.ium", bytes))
            .unwrap();
        let ids: Vec<_> = parsed.measurements.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(parsed.view, Some(state.view));
    }
}
