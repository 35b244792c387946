//! Frontend module for the viewer UI
//!
//! This module implements the graphical interface with egui/eframe.
//!
//! # Layout
//!
//! - Top bar: open, save, save as, full screen
//! - Left panel: measurement kinds and the measurements of the current kind
//! - Center: explorer plot of the current measurement, IR peaks table below
//! - Bottom bar: status line (last load, save, failures)
//!
//! # Data Flow
//!
//! The app owns the [`Store`] and a [`LoaderBridge`]. Loads run on the
//! loader thread; each finished batch arrives as one message and becomes
//! one `LOAD_FILES` dispatch. When nothing is selected yet, a reloaded
//! session's saved selection is dispatched right after it. Panels return [`UiAction`]s that
//! [`ViewerApp::handle_action`] applies.
//!
//! # Keyboard Shortcuts
//!
//! - `Ctrl+S` / `Cmd+S`: save the session
//! - `Ctrl+O` / `Cmd+O`: open files
//! - `F11`: toggle full screen

pub mod explorer;
pub mod panels;
pub mod plot;
pub mod state;

pub use explorer::{ExplorerInfo, ExplorerView};
pub use plot::PlotSeries;
pub use state::UiAction;

use std::path::PathBuf;
use std::thread::JoinHandle;

use egui::{Color32, RichText};

use crate::app::LaunchOptions;
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::loader::{FileCollection, FileItem, LoadFailure, LoadSource, LoaderBridge, LoaderMessage};
use crate::session;
use crate::store::{selectors, Action, Store};

/// Extensions offered by the open dialog
const OPEN_EXTENSIONS: [&str; 5] = ["json", "csv", "tsv", "txt", session::SESSION_FILE_EXTENSION];

/// A failed remote file-list request, kept for retrying
#[derive(Debug, Clone)]
struct FetchError {
    url: String,
    message: String,
}

/// Main application state
pub struct ViewerApp {
    store: Store,
    loader: LoaderBridge,
    loader_thread: Option<JoinHandle<()>>,
    config: ViewerConfig,
    config_path: Option<PathBuf>,
    explorer: ExplorerView,
    status: Option<String>,
    failures: Vec<LoadFailure>,
    fetch_error: Option<FetchError>,
    pending_loads: usize,
}

impl ViewerApp {
    /// Create a new application instance and start the loader thread
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: ViewerConfig,
        launch: LaunchOptions,
    ) -> Result<Self> {
        let mut style = (*cc.egui_ctx.style()).clone();
        style.text_styles.iter_mut().for_each(|(_, font_id)| {
            font_id.size *= config.ui.font_scale;
        });
        cc.egui_ctx.set_style(style);

        if config.ui.dark_mode {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
        } else {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
        }

        let repaint_ctx = cc.egui_ctx.clone();
        let (loader, loader_thread) = LoaderBridge::spawn(
            &config.loader,
            Some(Box::new(move || repaint_ctx.request_repaint())),
        )?;

        let mut app = Self {
            store: Store::new(),
            loader,
            loader_thread: Some(loader_thread),
            config,
            config_path: launch.config_path.clone(),
            explorer: ExplorerView::default(),
            status: None,
            failures: Vec::new(),
            fetch_error: None,
            pending_loads: 0,
        };

        if !launch.files.is_empty() {
            app.load_paths(launch.files);
        }
        if let Some(url) = launch.filelist {
            app.fetch_file_list(url);
        }

        Ok(app)
    }

    /// Read-only access to the store
    pub fn store(&self) -> &Store {
        &self.store
    }

    fn load_paths(&mut self, paths: Vec<PathBuf>) {
        tracing::info!("Loading {} path(s)", paths.len());
        if self.loader.load_paths(paths) {
            self.pending_loads += 1;
        }
    }

    fn fetch_file_list(&mut self, url: String) {
        tracing::info!("Loading file list from {}", url);
        if self.loader.fetch_file_list(url) {
            self.pending_loads += 1;
        }
    }

    fn process_loader_messages(&mut self) -> bool {
        let messages = self.loader.drain();
        let had_messages = !messages.is_empty();

        for msg in messages {
            self.pending_loads = self.pending_loads.saturating_sub(1);
            match msg {
                LoaderMessage::Loaded { source, report } => {
                    tracing::debug!(?source, "Load finished");
                    self.status = Some(report.summary());
                    self.failures = report.failures.clone();
                    let restore_view = self.store.state().view.current_measurement_kind.is_none();
                    for action in report.into_actions(restore_view) {
                        self.store.dispatch(action);
                    }
                    self.ensure_kind_selected();
                }
                LoaderMessage::FetchFailed { url, error } => {
                    self.fetch_error = Some(FetchError {
                        url,
                        message: error,
                    });
                }
            }
        }

        had_messages
    }

    /// Select the first kind after the first successful load
    fn ensure_kind_selected(&mut self) {
        if self.store.state().view.current_measurement_kind.is_some() {
            return;
        }
        let first = selectors::kinds(self.store.state()).next().map(str::to_string);
        if let Some(kind) = first {
            self.store.dispatch(Action::select_kind(kind));
        }
    }

    fn handle_action(&mut self, ctx: &egui::Context, action: UiAction) {
        match action {
            UiAction::Dispatch(action) => self.store.dispatch(action),
            UiAction::OpenFiles => {
                if let Some(paths) = rfd::FileDialog::new()
                    .set_title("Open Measurements")
                    .add_filter("Measurements", &OPEN_EXTENSIONS)
                    .pick_files()
                {
                    self.load_paths(paths);
                }
            }
            UiAction::SaveSession => {
                let dir = self.config.session.resolve_directory();
                match session::save_to_dir(self.store.state(), &dir, &self.config.session) {
                    Ok(path) => self.status = Some(format!("Saved {}", path.display())),
                    Err(e) => {
                        tracing::error!("Failed to save session: {}", e);
                        self.status = Some(format!("Save failed: {}", e));
                    }
                }
            }
            UiAction::SaveSessionAs => {
                if let Some(path) = rfd::FileDialog::new()
                    .set_title("Save Session")
                    .add_filter("Session", &[session::SESSION_FILE_EXTENSION])
                    .set_file_name(session::session_file_name(&self.config.session.default_filename))
                    .save_file()
                {
                    match session::save_to_path(self.store.state(), &path, self.config.session.indent) {
                        Ok(()) => self.status = Some(format!("Saved {}", path.display())),
                        Err(e) => {
                            tracing::error!("Failed to save session: {}", e);
                            self.status = Some(format!("Save failed: {}", e));
                        }
                    }
                }
            }
            UiAction::ToggleFullscreen => {
                let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
                ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!fullscreen));
            }
            UiAction::RetryFetch => {
                if let Some(error) = self.fetch_error.take() {
                    self.fetch_file_list(error.url);
                }
            }
            UiAction::DismissError => self.fetch_error = None,
            UiAction::TogglePeakColumn(index) => {
                if let Some(column) = self.config.peaks_table.columns.get_mut(index) {
                    column.visible = !column.visible;
                }
            }
        }
    }

    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        use egui::Key;

        let mut actions = Vec::new();

        ctx.input(|i| {
            if i.key_pressed(Key::S) && i.modifiers.command_only() {
                actions.push(UiAction::SaveSession);
            }

            if i.key_pressed(Key::O) && i.modifiers.command_only() {
                actions.push(UiAction::OpenFiles);
            }

            if i.key_pressed(Key::F11) {
                actions.push(UiAction::ToggleFullscreen);
            }
        });

        for action in actions {
            self.handle_action(ctx, action);
        }
    }

    /// Load files dropped on the window
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }

        let mut paths = Vec::new();
        let mut collection = FileCollection::new();
        for file in dropped {
            if let Some(path) = file.path {
                paths.push(path);
            } else if let Some(bytes) = file.bytes {
                collection.push(FileItem::new(file.name, bytes.to_vec()));
            }
        }

        if !paths.is_empty() {
            self.load_paths(paths);
        }
        if !collection.is_empty() {
            if self.loader.load_collection(LoadSource::Dropped, collection) {
                self.pending_loads += 1;
            }
        }
    }

    fn render_toolbar(&self, ui: &mut egui::Ui) -> Vec<UiAction> {
        let mut actions = Vec::new();
        ui.horizontal(|ui| {
            if ui.button("Open…").on_hover_text("Ctrl+O").clicked() {
                actions.push(UiAction::OpenFiles);
            }
            let has_data = selectors::measurement_count(self.store.state()) > 0;
            if ui
                .add_enabled(has_data, egui::Button::new("Save"))
                .on_hover_text("Ctrl+S")
                .clicked()
            {
                actions.push(UiAction::SaveSession);
            }
            if ui.add_enabled(has_data, egui::Button::new("Save As…")).clicked() {
                actions.push(UiAction::SaveSessionAs);
            }
            ui.separator();
            if ui.button("Full screen").on_hover_text("F11").clicked() {
                actions.push(UiAction::ToggleFullscreen);
            }
        });
        actions
    }

    fn render_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 8.0;

            let count = selectors::measurement_count(self.store.state());
            ui.label(RichText::new(format!("Measurements: {}", count)).small());

            if self.pending_loads > 0 {
                ui.separator();
                ui.spinner();
                ui.label(RichText::new("Loading…").small());
            }

            if let Some(status) = &self.status {
                ui.separator();
                ui.label(RichText::new(status).small());
            }

            if !self.failures.is_empty() {
                ui.separator();
                let details = self
                    .failures
                    .iter()
                    .map(LoadFailure::to_string)
                    .collect::<Vec<_>>()
                    .join("\n");
                ui.colored_label(
                    Color32::from_rgb(255, 180, 60),
                    RichText::new(format!("{} file(s) failed", self.failures.len())).small(),
                )
                .on_hover_text(details);
            }
        });
    }

    fn render_error_window(&self, ctx: &egui::Context) -> Vec<UiAction> {
        let mut actions = Vec::new();
        let Some(error) = &self.fetch_error else {
            return actions;
        };

        egui::Window::new("Something went wrong")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("Could not load {}", error.url));
                ui.colored_label(Color32::RED, &error.message);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Try again").clicked() {
                        actions.push(UiAction::RetryFetch);
                    }
                    if ui.button("Close").clicked() {
                        actions.push(UiAction::DismissError);
                    }
                });
            });

        actions
    }

    fn render_central(&mut self, ui: &mut egui::Ui) -> Vec<UiAction> {
        let mut actions = Vec::new();
        let state = self.store.state();

        let Some(measurement) = selectors::current_measurement(state) else {
            self.explorer.sync(None);
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No data, add them with drag and drop").heading().weak());
            });
            return actions;
        };

        self.explorer.sync(Some(measurement));
        let peaks = measurement.peaks(self.explorer.info().data_index);
        if !peaks.is_empty() || measurement.kind == "ir" {
            egui::TopBottomPanel::bottom("peaks_panel")
                .resizable(true)
                .default_height(180.0)
                .show_inside(ui, |ui| {
                    actions.extend(panels::render_peaks_panel(
                        ui,
                        peaks,
                        &self.config.peaks_table,
                    ));
                });
        }

        self.explorer.ui(ui, measurement, self.store.revision());
        actions
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let had_messages = self.process_loader_messages();
        self.handle_keyboard_shortcuts(ctx);
        self.handle_dropped_files(ctx);

        if had_messages {
            ctx.request_repaint();
        }

        let mut actions = Vec::new();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            actions.extend(self.render_toolbar(ui));
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.render_status_bar(ui);
        });

        egui::SidePanel::left("measurements_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                actions.extend(panels::render_measurements_panel(ui, self.store.state()));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            actions.extend(self.render_central(ui));
        });

        if ctx.input(|i| !i.raw.hovered_files.is_empty()) {
            egui::Area::new(egui::Id::new("drop_hint"))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(RichText::new("Drop files to load").heading().strong());
                });
        }

        actions.extend(self.render_error_window(ctx));

        for action in actions {
            self.handle_action(ctx, action);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let _ = self.loader.shutdown();
        if let Some(handle) = self.loader_thread.take() {
            if handle.join().is_err() {
                tracing::error!("Loader thread panicked");
            }
        }

        let saved = match &self.config_path {
            Some(path) => self.config.save_to(path),
            None => self.config.save(),
        };
        if let Err(e) = saved {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}
