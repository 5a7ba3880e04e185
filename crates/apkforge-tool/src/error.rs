//! Error types for apkforge-tool.

use std::io;

use apkforge_archive::ArchiveError;
use apkforge_fetch::FetchError;
use apkforge_progress::Cancelled;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("HTTP request failed for {url}: status {status}")]
    Http { url: String, status: u16 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Post-transfer validation failed; the partial file has been deleted.
    /// Distinct from a transfer failure so operators can tell bad network
    /// from bad upstream metadata.
    #[error("incomplete or corrupt download of {name} v{version}")]
    CorruptDownload { name: String, version: String },

    #[error("unable to resolve metadata for {tool}: {detail}")]
    Metadata { tool: String, detail: String },

    #[error("self-test of {name} failed with exit code {code}")]
    SelfTest { name: String, code: i32 },

    #[error("{name} is not ready after setup")]
    NotReady { name: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error("file I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ToolError {
    pub fn metadata(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Metadata {
            tool: tool.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;
