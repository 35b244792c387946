//! Thread boundary between the loader worker and the UI.
//!
//! The UI sends [`LoaderCommand`]s; the worker reads and parses files (and
//! downloads remote file lists) off the UI thread and answers every load
//! with exactly one [`LoaderMessage`]. The UI drains messages once per
//! frame and turns each `Loaded` report into a single `LOAD_FILES` action.

use std::path::PathBuf;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender};

use super::{load_files, FileCollection, LoadReport, ParserRegistry, RemoteFileList};
use crate::config::LoaderConfig;
use crate::error::Result;

/// Where a batch of files came from
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSource {
    /// Paths from the command line or the open dialog
    Paths,
    /// Files dropped on the window
    Dropped,
    /// A remote file list
    Remote(String),
}

/// Commands sent from the UI thread to the loader.
#[derive(Debug, Clone)]
pub enum LoaderCommand {
    /// Read and parse files or directories from disk.
    LoadPaths(Vec<PathBuf>),
    /// Parse files already in memory.
    LoadCollection {
        source: LoadSource,
        collection: FileCollection,
    },
    /// Download a file list and parse every file it names.
    FetchFileList(String),
    /// Shut down the loader thread.
    Shutdown,
}

/// Messages sent from the loader to the UI thread.
#[derive(Debug, Clone)]
pub enum LoaderMessage {
    /// A batch finished; failures are inside the report.
    Loaded { source: LoadSource, report: LoadReport },
    /// The file list itself could not be retrieved.
    FetchFailed { url: String, error: String },
}

/// Called after each message so the UI can repaint.
pub type RepaintWaker = Box<dyn Fn() + Send>;

/// Channel capacity for commands (UI → loader).
const CMD_CHANNEL_CAPACITY: usize = 64;
/// Channel capacity for messages (loader → UI).
const MSG_CHANNEL_CAPACITY: usize = 64;

/// UI-side handle for communicating with the loader thread.
pub struct LoaderBridge {
    pub cmd_tx: Sender<LoaderCommand>,
    pub msg_rx: Receiver<LoaderMessage>,
}

impl LoaderBridge {
    /// Create a new bridge pair: `(bridge_for_ui, cmd_rx, msg_tx)`.
    ///
    /// The loader thread owns `cmd_rx` and `msg_tx`.
    pub fn new() -> (Self, Receiver<LoaderCommand>, Sender<LoaderMessage>) {
        let (cmd_tx, cmd_rx) = bounded(CMD_CHANNEL_CAPACITY);
        let (msg_tx, msg_rx) = bounded(MSG_CHANNEL_CAPACITY);
        (Self { cmd_tx, msg_rx }, cmd_rx, msg_tx)
    }

    /// Create a bridge and start a worker thread behind it.
    pub fn spawn(
        config: &LoaderConfig,
        waker: Option<RepaintWaker>,
    ) -> Result<(Self, JoinHandle<()>)> {
        let (bridge, cmd_rx, msg_tx) = Self::new();
        let mut worker = LoaderWorker::new(config, cmd_rx, msg_tx)?;
        if let Some(waker) = waker {
            worker = worker.with_waker(waker);
        }
        let handle = std::thread::Builder::new()
            .name("loader".to_string())
            .spawn(move || worker.run())?;
        Ok((bridge, handle))
    }

    /// Drain all pending messages.
    pub fn drain(&self) -> Vec<LoaderMessage> {
        let mut msgs = Vec::new();
        while let Ok(msg) = self.msg_rx.try_recv() {
            msgs.push(msg);
        }
        msgs
    }

    /// Send a command; `false` once the loader thread is gone.
    pub fn send_command(&self, cmd: LoaderCommand) -> bool {
        let sent = self.cmd_tx.send(cmd).is_ok();
        if !sent {
            tracing::warn!("Loader thread is not running");
        }
        sent
    }

    pub fn load_paths(&self, paths: Vec<PathBuf>) -> bool {
        self.send_command(LoaderCommand::LoadPaths(paths))
    }

    pub fn load_collection(&self, source: LoadSource, collection: FileCollection) -> bool {
        self.send_command(LoaderCommand::LoadCollection { source, collection })
    }

    pub fn fetch_file_list(&self, url: impl Into<String>) -> bool {
        self.send_command(LoaderCommand::FetchFileList(url.into()))
    }

    pub fn shutdown(&self) -> bool {
        self.send_command(LoaderCommand::Shutdown)
    }
}

/// Loader side: owns the parsers, the HTTP client and a tokio runtime.
pub struct LoaderWorker {
    registry: ParserRegistry,
    remote: RemoteFileList,
    runtime: tokio::runtime::Runtime,
    cmd_rx: Receiver<LoaderCommand>,
    msg_tx: Sender<LoaderMessage>,
    waker: Option<RepaintWaker>,
}

impl LoaderWorker {
    pub fn new(
        config: &LoaderConfig,
        cmd_rx: Receiver<LoaderCommand>,
        msg_tx: Sender<LoaderMessage>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            registry: ParserRegistry::with_defaults(config),
            remote: RemoteFileList::new(config)?,
            runtime,
            cmd_rx,
            msg_tx,
            waker: None,
        })
    }

    pub fn with_waker(mut self, waker: RepaintWaker) -> Self {
        self.waker = Some(waker);
        self
    }

    /// Process commands until shutdown or until the UI side hangs up.
    pub fn run(self) {
        tracing::debug!("Loader thread started");
        while let Ok(cmd) = self.cmd_rx.recv() {
            if matches!(cmd, LoaderCommand::Shutdown) {
                break;
            }
            if let Some(msg) = self.handle(cmd) {
                if self.msg_tx.send(msg).is_err() {
                    break;
                }
                if let Some(waker) = &self.waker {
                    waker();
                }
            }
        }
        tracing::debug!("Loader thread stopped");
    }

    /// Execute one command and build its reply.
    pub fn handle(&self, cmd: LoaderCommand) -> Option<LoaderMessage> {
        match cmd {
            LoaderCommand::LoadPaths(paths) => {
                let (collection, read_failures) = FileCollection::from_paths(&paths);
                let mut report = LoadReport {
                    failures: read_failures,
                    ..LoadReport::default()
                };
                report.merge(load_files(&collection, &self.registry));
                Some(LoaderMessage::Loaded {
                    source: LoadSource::Paths,
                    report,
                })
            }
            LoaderCommand::LoadCollection { source, collection } => Some(LoaderMessage::Loaded {
                source,
                report: load_files(&collection, &self.registry),
            }),
            LoaderCommand::FetchFileList(url) => {
                match self.runtime.block_on(self.remote.fetch(&url)) {
                    Ok((collection, download_failures)) => {
                        let mut report = LoadReport {
                            failures: download_failures,
                            ..LoadReport::default()
                        };
                        report.merge(load_files(&collection, &self.registry));
                        Some(LoaderMessage::Loaded {
                            source: LoadSource::Remote(url),
                            report,
                        })
                    }
                    Err(e) => {
                        tracing::error!(url = %url, error = %e, "Failed to fetch file list");
                        Some(LoaderMessage::FetchFailed {
                            url,
                            error: e.to_string(),
                        })
                    }
                }
            }
            LoaderCommand::Shutdown => None,
        }
    }
}
