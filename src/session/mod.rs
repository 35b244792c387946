//! Session save/export
//!
//! A session is the whole [`AppState`] (loaded data plus view selection)
//! written as a `.ium` JSON document. Saving mirrors a browser download: the
//! blob is named `<filename>.ium` and written to the configured save
//! directory. Reloading a session goes through the file loader, which
//! recognizes the `.ium` extension and restores the saved selection.

pub mod codec;

pub use codec::{decode, encode, SessionDocument, SESSION_FORMAT_VERSION};

use std::path::{Path, PathBuf};

use crate::config::SessionConfig;
use crate::error::{Result, ResultExt, ViewerError};
use crate::store::AppState;

/// Session file extension
pub const SESSION_FILE_EXTENSION: &str = "ium";

/// Filename used when none is given
pub const DEFAULT_SESSION_NAME: &str = "file";

/// `<filename>.ium`, falling back to the default name for blank input
pub fn session_file_name(filename: &str) -> String {
    let name = filename.trim();
    let name = if name.is_empty() {
        DEFAULT_SESSION_NAME
    } else {
        name
    };
    format!("{}.{}", name, SESSION_FILE_EXTENSION)
}

/// Write a session blob to an explicit path
pub fn save_to_path(state: &AppState, path: impl AsRef<Path>, indent: usize) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode(state, indent)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(ViewerError::from)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    std::fs::write(path, bytes)
        .map_err(ViewerError::from)
        .with_context(|| format!("Failed to write session {:?}", path))?;

    tracing::info!("Saved session to {:?}", path);
    Ok(())
}

/// Save with the configured filename and indentation into `dir`
pub fn save_to_dir(state: &AppState, dir: impl AsRef<Path>, config: &SessionConfig) -> Result<PathBuf> {
    let path = dir
        .as_ref()
        .join(session_file_name(&config.default_filename));
    save_to_path(state, &path, config.indent)?;
    Ok(path)
}
