//! Remote file lists
//!
//! A file list is a JSON array (or `{"files": [...]}`) of
//! `{ name, relativePath?, url? }` entries served over HTTP. Each file's URL
//! is resolved against the list URL: an explicit `url` wins, then
//! `relativePath`, then `name`.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use super::{FileCollection, FileItem, LoadFailure};
use crate::config::LoaderConfig;
use crate::error::{Result, ViewerError};

const USER_AGENT: &str = concat!("iumview/", env!("CARGO_PKG_VERSION"));

/// One entry of a remote file list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFileEntry {
    pub name: String,
    #[serde(default)]
    pub relative_path: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl RemoteFileEntry {
    /// Path of the file inside the collection
    pub fn collection_path(&self) -> &str {
        self.relative_path
            .as_deref()
            .map(|p| p.trim_start_matches('/'))
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.name)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FileListDocument {
    Entries(Vec<RemoteFileEntry>),
    Wrapped { files: Vec<RemoteFileEntry> },
}

impl FileListDocument {
    fn into_entries(self) -> Vec<RemoteFileEntry> {
        match self {
            FileListDocument::Entries(entries) => entries,
            FileListDocument::Wrapped { files } => files,
        }
    }
}

/// Absolute URL of an entry, relative to the list it came from
pub fn resolve_entry_url(base: &Url, entry: &RemoteFileEntry) -> Result<Url> {
    let target = entry
        .url
        .as_deref()
        .unwrap_or_else(|| entry.collection_path());
    base.join(target)
        .map_err(|e| ViewerError::Fetch(format!("Invalid URL for {}: {}", entry.name, e)))
}

/// HTTP client for remote file lists
#[derive(Debug, Clone)]
pub struct RemoteFileList {
    client: reqwest::Client,
}

impl RemoteFileList {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| ViewerError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }

    /// Download a file list and every file it names
    ///
    /// Failing to get or decode the list itself is an error. Files that
    /// fail to download are returned as failures next to the collection.
    pub async fn fetch(&self, list_url: &str) -> Result<(FileCollection, Vec<LoadFailure>)> {
        let base = Url::parse(list_url)
            .map_err(|e| ViewerError::Fetch(format!("Invalid file list URL {}: {}", list_url, e)))?;

        tracing::info!(url = %base, "Fetching file list");
        let entries = self
            .get_bytes(base.clone())
            .await
            .and_then(|bytes| {
                serde_json::from_slice::<FileListDocument>(&bytes)
                    .map_err(|e| ViewerError::Fetch(format!("Invalid file list: {}", e)))
            })?
            .into_entries();

        let mut collection = FileCollection::new();
        let mut failures = Vec::new();
        for entry in entries {
            let path = entry.collection_path().to_string();
            let result = match resolve_entry_url(&base, &entry) {
                Ok(url) => self.get_bytes(url).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(bytes) => collection.push(FileItem::new(path, bytes)),
                Err(e) => {
                    tracing::warn!(file = %path, error = %e, "Failed to download file");
                    failures.push(LoadFailure::new(path, e.to_string()));
                }
            }
        }

        tracing::debug!(
            files = collection.len(),
            failures = failures.len(),
            "Fetched file list"
        );
        Ok((collection, failures))
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ViewerError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::Fetch(format!("{} returned {}", url, status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ViewerError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
