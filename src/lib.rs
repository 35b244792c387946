//! # iumview: Measurement Viewer
//!
//! A desktop viewer for spectroscopy and other scientific measurement files.
//! Files are dropped on the window (or opened, passed on the command line,
//! or listed by a remote file list), parsed into typed measurements and
//! grouped by kind; the current measurement is plotted and its IR peaks
//! tabulated. The whole state can be saved as a `.ium` session.
//!
//! ## Architecture
//!
//! - **Store**: a single [`store::AppState`] changed only by dispatching
//!   [`store::Action`]s through a pure reducer
//! - **Loader**: parsers and remote file lists run on a worker thread behind
//!   a crossbeam channel bridge
//! - **Session**: JSON codec for `.ium` files
//! - **Frontend**: eframe/egui with egui_plot for the explorer plot
//!
//! ## Configuration
//!
//! Configuration and logs are stored in the platform-appropriate data
//! directory under `dev.iumview` (see [`config`]).
//!
//! ## Example
//!
//! ```ignore
//! use iumview::store::{selectors, Action, Store};
//! use iumview::types::Measurement;
//!
//! let mut store = Store::new();
//! store.dispatch(Action::load_files(vec![Measurement::new("m1", "ir")]));
//! store.dispatch(Action::select_kind("ir"));
//! assert_eq!(selectors::current_measurement(store.state()).unwrap().id, "m1");
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod frontend;
pub mod loader;
pub mod session;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use app::{LaunchOptions, ViewerApp};
pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
pub use store::{Action, AppState, Store};
pub use types::{Measurement, MeasurementData, Variable};
