//! Application module
//!
//! Re-exports the main application type and holds the launch options
//! collected by the command line.

use std::path::PathBuf;

pub use crate::frontend::ViewerApp;

/// What to load when the window opens
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchOptions {
    /// Files and directories to load
    pub files: Vec<PathBuf>,
    /// Remote file-list URL
    pub filelist: Option<String>,
    /// Where the configuration is saved on exit; the default location when
    /// unset
    pub config_path: Option<PathBuf>,
}

impl LaunchOptions {
    pub fn has_initial_load(&self) -> bool {
        !self.files.is_empty() || self.filelist.is_some()
    }
}
