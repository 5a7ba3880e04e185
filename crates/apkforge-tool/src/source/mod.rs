//! Where tool artifacts come from.
//!
//! A source knows how to resolve a version request into concrete
//! download metadata and how to validate the bytes that arrived. The
//! acquisition flow itself lives in [`crate::Artifact`].

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use apkforge_fetch::Decoder;

use crate::error::{Result, ToolError};

pub mod github;
pub mod gitiles;

/// Everything needed to download and later validate one artifact.
#[derive(Debug, Clone)]
pub struct ArtifactMetadata {
    /// File name the artifact is stored under.
    pub file_name: String,
    /// Concrete version, never "latest".
    pub version: String,
    /// Download URL.
    pub url: String,
    /// MIME type as reported by the source, if any.
    pub content_type: Option<String>,
    /// Expected decoded size in bytes, if the source knows it.
    pub size: Option<u64>,
    /// Expected digest, if the source knows it. Interpretation is up to
    /// the source's `validate`.
    pub hash: Option<Vec<u8>>,
}

/// A provider of versioned tool artifacts.
pub trait ToolSource: Send + Sync {
    /// Short name used in errors and logs.
    fn name(&self) -> &str;

    /// Resolve a version request ("latest" or a concrete version) into
    /// download metadata. "latest" is resolved here, exactly once per
    /// artifact.
    fn resolve(&self, version: &str) -> impl Future<Output = Result<ArtifactMetadata>> + Send;

    /// Mid-stream decoder for the response body, if the source serves
    /// the artifact in a transfer encoding.
    fn decoder(&self) -> Option<Box<dyn Decoder>> {
        None
    }

    /// Extra request headers the source requires.
    fn headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    /// Whether the downloaded file is an archive to extract in place.
    fn unpack(&self) -> bool {
        false
    }

    /// Check a downloaded file against the resolved metadata.
    fn validate(
        &self,
        path: &Path,
        meta: &ArtifactMetadata,
    ) -> impl Future<Output = Result<bool>> + Send;
}

/// Map an HTTP error status to [`ToolError::Http`] before reading a body.
pub(crate) fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(ToolError::Http {
            url: response.url().to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}
