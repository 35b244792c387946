//! Error handling for the viewer
//!
//! This module defines the crate error type and a Result alias for use
//! throughout the application.

use thiserror::Error;

/// Main error type for viewer operations
#[derive(Error, Debug)]
pub enum ViewerError {
    /// A single file could not be turned into measurements
    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    /// No registered parser accepts the file
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    /// Remote file list could not be retrieved
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Raw action with a type outside the closed action set
    #[error("Unknown action type: {0}")]
    UnknownAction(String),

    /// Raw action with a known type but a malformed payload
    #[error("Invalid action payload for {action}: {message}")]
    InvalidAction { action: String, message: String },

    /// Errors related to session save/load
    #[error("Session error: {0}")]
    Session(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ViewerError>,
    },
}

impl ViewerError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ViewerError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a parse error for a named file
    pub fn parse(file: impl Into<String>, message: impl ToString) -> Self {
        ViewerError::Parse {
            file: file.into(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::Serialization(err.to_string())
    }
}

/// Result type alias for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
