//! Action types for the frontend
//!
//! Panels return `Vec<UiAction>` instead of mutating the store or the app
//! directly; [`super::ViewerApp`] handles them in one place.

use crate::store::Action;

/// Actions that any panel can emit
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Run a store action through the reducer
    Dispatch(Action),
    /// Pick files with the native dialog and load them
    OpenFiles,
    /// Save the session with the configured name and directory
    SaveSession,
    /// Save the session to a path chosen in a dialog
    SaveSessionAs,
    /// Toggle full screen
    ToggleFullscreen,
    /// Re-send the failed remote file-list request
    RetryFetch,
    /// Close the error window
    DismissError,
    /// Show or hide an IR peaks table column
    TogglePeakColumn(usize),
}
