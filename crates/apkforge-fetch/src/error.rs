//! Error types for apkforge-fetch.

use std::io;

use apkforge_progress::Cancelled;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a failure status before any byte was
    /// written. Carries the failing request's target for diagnostics.
    #[error("HTTP request failed for {url}: status {status}")]
    Http { url: String, status: u16 },

    #[error("network error fetching {url}: {detail}")]
    Network { url: String, detail: String },

    #[error("decode filter failed: {0}")]
    Decode(String),

    #[error("file I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

pub type Result<T> = std::result::Result<T, FetchError>;
