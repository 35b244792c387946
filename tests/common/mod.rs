//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use iumview::store::AppState;

/// Ids of one kind group, in order
pub fn ids_of_kind(state: &AppState, kind: &str) -> Vec<String> {
    state
        .data
        .measurements
        .get(kind)
        .map(|group| group.entries.iter().map(|m| m.id.clone()).collect())
        .unwrap_or_default()
}

/// Every id in the state, kinds in order
pub fn all_ids(state: &AppState) -> Vec<String> {
    iumview::store::selectors::all_measurements(state)
        .map(|m| m.id.clone())
        .collect()
}

/// Write a file under `dir`, creating parent directories
pub fn write_file(dir: &std::path::Path, relative: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}
