//! File loading
//!
//! Bridges raw files (dropped, opened, passed on the command line or listed
//! by a remote file list) to the store. Every file is handed to the
//! [`ParserRegistry`]; files that fail are collected in the
//! [`LoadReport`] and skipped, and the measurements of all the others are
//! dispatched together as one `LOAD_FILES` action. A reloaded session also
//! brings back its saved selection.
//!
//! # Submodules
//!
//! - [`parsers`] - Parser trait and the built-in JSON, delimited text and
//!   session parsers
//! - [`remote`] - Remote file-list retrieval over HTTP
//! - [`bridge`] - Loader worker thread and its channel bridge to the UI

pub mod bridge;
pub mod parsers;
pub mod remote;

pub use bridge::{LoadSource, LoaderBridge, LoaderCommand, LoaderMessage, LoaderWorker};
pub use parsers::{
    DelimitedTextParser, JsonMeasurementParser, MeasurementParser, ParsedFile, ParserRegistry,
    SessionFileParser,
};
pub use remote::{RemoteFileEntry, RemoteFileList};

use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, ViewerError};
use crate::store::{Action, ViewState};
use crate::types::Measurement;

/// A file's name, path within its collection and raw contents
#[derive(Debug, Clone, PartialEq)]
pub struct FileItem {
    pub name: String,
    pub relative_path: String,
    pub bytes: Vec<u8>,
}

impl FileItem {
    /// Create an item; the name is the last `/`-separated path segment
    pub fn new(relative_path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let relative_path = relative_path.into();
        let name = relative_path
            .rsplit('/')
            .next()
            .unwrap_or(relative_path.as_str())
            .to_string();
        Self {
            name,
            relative_path,
            bytes,
        }
    }

    /// Read a file from disk, naming it relative to `base`
    pub fn read(path: &Path, base: Option<&Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let relative = base
            .and_then(|b| path.strip_prefix(b).ok())
            .unwrap_or_else(|| Path::new(path.file_name().unwrap_or(path.as_os_str())));
        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Ok(Self::new(relative_path, bytes))
    }

    /// Lowercase extension of the file name
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }

    /// Contents as UTF-8 text
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.bytes).map_err(|e| ViewerError::parse(&self.relative_path, e))
    }
}

/// A heterogeneous batch of files
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileCollection {
    pub files: Vec<FileItem>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: FileItem) {
        self.files.push(file);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileItem> {
        self.files.iter()
    }

    /// Read files and directories from disk
    ///
    /// Directories are walked recursively and their files are named
    /// relative to the directory's parent, so `spectra/ir.csv` keeps its
    /// folder. Hidden entries are skipped. Unreadable paths become failures
    /// instead of aborting the batch.
    pub fn from_paths(paths: &[PathBuf]) -> (Self, Vec<LoadFailure>) {
        let mut collection = Self::new();
        let mut failures = Vec::new();

        for path in paths {
            if path.is_dir() {
                let base = path.parent();
                let walker = WalkDir::new(path)
                    .follow_links(false)
                    .into_iter()
                    .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
                for entry in walker {
                    match entry {
                        Ok(entry) if entry.file_type().is_file() => {
                            match FileItem::read(entry.path(), base) {
                                Ok(item) => collection.push(item),
                                Err(e) => failures.push(LoadFailure::new(
                                    entry.path().display().to_string(),
                                    e.to_string(),
                                )),
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!("Error accessing entry: {}", e);
                            failures.push(LoadFailure::new(path.display().to_string(), e.to_string()));
                        }
                    }
                }
            } else {
                match FileItem::read(path, None) {
                    Ok(item) => collection.push(item),
                    Err(e) => failures.push(LoadFailure::new(path.display().to_string(), e.to_string())),
                }
            }
        }

        (collection, failures)
    }
}

impl FromIterator<FileItem> for FileCollection {
    fn from_iter<I: IntoIterator<Item = FileItem>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// A file that could not be loaded
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub file: String,
    pub message: String,
}

impl LoadFailure {
    pub fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}

/// Outcome of loading one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub measurements: Vec<Measurement>,
    pub failures: Vec<LoadFailure>,
    /// Selection of the last session file in the batch
    pub view: Option<ViewState>,
}

impl LoadReport {
    /// Append another report's results
    pub fn merge(&mut self, other: LoadReport) {
        self.measurements.extend(other.measurements);
        self.failures.extend(other.failures);
        if other.view.is_some() {
            self.view = other.view;
        }
    }

    /// The single `LOAD_FILES` action for this batch, if anything parsed
    pub fn into_action(self) -> Option<Action> {
        if self.measurements.is_empty() {
            None
        } else {
            Some(Action::load_files(self.measurements))
        }
    }

    /// `LOAD_FILES`, followed by the selection of a reloaded session when
    /// `restore_view` is set
    ///
    /// A saved measurement selection becomes `SELECT_MEASUREMENT`; a saved
    /// kind without a measurement becomes `SELECT_MEASUREMENT_KIND`.
    pub fn into_actions(mut self, restore_view: bool) -> Vec<Action> {
        let view = self.view.take().filter(|_| restore_view);
        let Some(load) = self.into_action() else {
            return Vec::new();
        };

        let mut actions = vec![load];
        if let Some(ViewState {
            current_measurement_kind: Some(kind),
            current_measurement,
        }) = view
        {
            actions.push(match current_measurement {
                Some(id) => Action::select_measurement(id, kind),
                None => Action::select_kind(kind),
            });
        }
        actions
    }

    /// One-line description for the status bar
    pub fn summary(&self) -> String {
        match (self.measurements.len(), self.failures.len()) {
            (0, 0) => "No files loaded".to_string(),
            (n, 0) => format!("Loaded {} measurement(s)", n),
            (n, f) => format!("Loaded {} measurement(s), {} file(s) skipped", n, f),
        }
    }
}

/// Parse every file of a collection
///
/// Failures are logged and collected; they never abort the batch.
pub fn load_files(collection: &FileCollection, registry: &ParserRegistry) -> LoadReport {
    let mut report = LoadReport::default();

    for file in collection.iter() {
        match registry.parse(file) {
            Ok(parsed) => {
                tracing::debug!(
                    file = %file.relative_path,
                    count = parsed.measurements.len(),
                    "Parsed file"
                );
                report.measurements.extend(parsed.measurements);
                if parsed.view.is_some() {
                    report.view = parsed.view;
                }
            }
            Err(e) => {
                tracing::warn!(file = %file.relative_path, error = %e, "Skipping file");
                report
                    .failures
                    .push(LoadFailure::new(file.relative_path.clone(), e.to_string()));
            }
        }
    }

    tracing::info!(
        files = collection.len(),
        measurements = report.measurements.len(),
        failures = report.failures.len(),
        "Loaded file collection"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parsers::MockMeasurementParser;

    fn mock_parser() -> MockMeasurementParser {
        let mut parser = MockMeasurementParser::new();
        parser.expect_name().return_const("mock");
        parser
            .expect_supports()
            .returning(|file| file.extension().as_deref() == Some("dat"));
        parser.expect_parse().returning(|file| {
            if file.bytes.is_empty() {
                Err(ViewerError::parse(&file.relative_path, "empty file"))
            } else {
                Ok(vec![Measurement::new(file.stem(), "ir")].into())
            }
        });
        parser
    }

    #[test]
    fn test_file_item_names() {
        let item = FileItem::new("spectra/ethanol.IR.csv", Vec::new());
        assert_eq!(item.name, "ethanol.IR.csv");
        assert_eq!(item.extension().as_deref(), Some("csv"));
        assert_eq!(item.stem(), "ethanol.IR");

        let item = FileItem::new(".hidden", Vec::new());
        assert_eq!(item.extension(), None);
        assert_eq!(item.stem(), ".hidden");
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let mut registry = ParserRegistry::new();
        registry.register(Box::new(mock_parser()));

        let collection: FileCollection = vec![
            FileItem::new("a.dat", b"1".to_vec()),
            FileItem::new("broken.dat", Vec::new()),
            FileItem::new("notes.docx", b"?".to_vec()),
            FileItem::new("b.dat", b"2".to_vec()),
        ]
        .into_iter()
        .collect();

        let report = load_files(&collection, &registry);
        let ids: Vec<_> = report.measurements.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        let failed: Vec<_> = report.failures.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(failed, vec!["broken.dat", "notes.docx"]);
        assert_eq!(report.summary(), "Loaded 2 measurement(s), 2 file(s) skipped");
    }

    #[test]
    fn test_report_without_measurements_has_no_action() {
        let report = LoadReport {
            failures: vec![LoadFailure::new("x.dat", "bad")],
            ..LoadReport::default()
        };
        assert!(report.into_action().is_none());
    }

    #[test]
    fn test_report_batches_into_one_action() {
        let report = LoadReport {
            measurements: vec![Measurement::new("a", "ir"), Measurement::new("b", "1h")],
            ..LoadReport::default()
        };
        match report.into_action() {
            Some(Action::LoadFiles { measurements }) => assert_eq!(measurements.len(), 2),
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_saved_view_follows_load() {
        let report = LoadReport {
            measurements: vec![Measurement::new("a", "ir"), Measurement::new("b", "1h")],
            view: Some(ViewState {
                current_measurement_kind: Some("1h".to_string()),
                current_measurement: Some("b".to_string()),
            }),
            ..LoadReport::default()
        };

        let actions = report.clone().into_actions(true);
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], Action::LoadFiles { .. }));
        assert_eq!(actions[1], Action::select_measurement("b", "1h"));

        assert_eq!(report.into_actions(false).len(), 1);
    }

    #[test]
    fn test_saved_kind_only_selects_kind() {
        let report = LoadReport {
            measurements: vec![Measurement::new("a", "ir")],
            view: Some(ViewState {
                current_measurement_kind: Some("ir".to_string()),
                current_measurement: None,
            }),
            ..LoadReport::default()
        };
        assert_eq!(report.into_actions(true)[1], Action::select_kind("ir"));

        let empty = LoadReport {
            view: Some(ViewState::default()),
            ..LoadReport::default()
        };
        assert!(empty.into_actions(true).is_empty());
    }

    #[test]
    fn test_from_paths_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        let spectra = dir.path().join("spectra");
        std::fs::create_dir_all(spectra.join("ir")).unwrap();
        std::fs::write(spectra.join("a.csv"), "1,2\n").unwrap();
        std::fs::write(spectra.join("ir").join("b.csv"), "3,4\n").unwrap();
        std::fs::write(spectra.join(".DS_Store"), "junk").unwrap();

        let (collection, failures) =
            FileCollection::from_paths(&[spectra.clone(), dir.path().join("missing.csv")]);

        let mut paths: Vec<_> = collection.iter().map(|f| f.relative_path.clone()).collect();
        paths.sort();
        assert_eq!(paths, vec!["spectra/a.csv", "spectra/ir/b.csv"]);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].file.ends_with("missing.csv"));
    }
}
