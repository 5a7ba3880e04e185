//! Gitiles (android.googlesource.com) as a tool source.
//!
//! Gitiles never serves raw file bytes. `?format=TEXT` returns the blob
//! base64-encoded, JSON endpoints carry a 5-byte XSSI guard prefix, and
//! the only place the decoded size appears is the human-readable page.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use apkforge_fetch::{Base64Decoder, Decoder};

use crate::error::{Result, ToolError};
use crate::hash::git_blob_sha1;
use crate::source::{ArtifactMetadata, ToolSource, check_response};
use crate::version;

/// `)]}'\n` — see https://github.com/google/gitiles/issues/22
const XSSI_PREFIX_LEN: usize = 5;

static RE_PARSE_SIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)-byte").unwrap());

/// Strip the XSSI guard from a Gitiles JSON response.
fn strip_xssi(text: &str) -> &str {
    text.get(XSSI_PREFIX_LEN..).unwrap_or("")
}

/// Versions are the keys of the directory-listing object.
fn parse_versions(listing: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(strip_xssi(listing))
        .map_err(|e| ToolError::metadata("gitiles", format!("bad directory listing: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| ToolError::metadata("gitiles", "directory listing is not an object"))?;
    Ok(object.keys().cloned().collect())
}

/// Scrape the decoded blob size from the human-readable page.
fn scrape_size(page: &str) -> Option<u64> {
    RE_PARSE_SIZE
        .captures(page)
        .and_then(|caps| caps[1].parse().ok())
}

/// Replace the `format` query parameter. Gitiles URLs built here carry
/// exactly one query parameter, so splitting at `?` is enough.
fn swap_format(url: &str, format: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    format!("{path}?format={format}")
}

/// A single file served by a Gitiles instance, versioned by the
/// directories of a listing page.
pub struct GitilesFile {
    name: String,
    /// Directory-listing URL ending in `/`, one subdirectory per version.
    listing_url: String,
    /// Path of the file inside a version directory.
    blob_path: String,
    /// Restrict version selection to these names, when present.
    allowed_versions: Option<Vec<String>>,
    client: reqwest::Client,
}

impl GitilesFile {
    pub fn new(
        name: impl Into<String>,
        listing_url: impl Into<String>,
        blob_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            listing_url: listing_url.into(),
            blob_path: blob_path.into(),
            allowed_versions: None,
            client: reqwest::Client::new(),
        }
    }

    /// Only consider these versions when resolving "latest".
    #[must_use]
    pub fn allowed_versions(mut self, versions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_versions = Some(versions.into_iter().map(Into::into).collect());
        self
    }

    fn blob_url(&self, version: &str) -> String {
        format!(
            "{}{version}/+/refs/heads/master/{}?format=TEXT",
            self.listing_url, self.blob_path
        )
    }

    fn file_name(&self) -> &str {
        self.blob_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.blob_path)
    }

    async fn latest_version(&self) -> Result<String> {
        let response = self
            .client
            .get(format!("{}?format=JSON", self.listing_url))
            .send()
            .await?;
        let body = check_response(response)?.text().await?;
        let mut versions = parse_versions(&body)?;
        if let Some(allowed) = &self.allowed_versions {
            versions.retain(|v| allowed.contains(v));
        }
        version::latest(&versions).ok_or_else(|| {
            ToolError::metadata(&self.name, "directory listing has no usable versions")
        })
    }

    async fn blob_size(&self, blob_url: &str) -> Result<u64> {
        let page_url = swap_format(blob_url, "");
        let response = self.client.get(&page_url).send().await?;
        let page = check_response(response)?.text().await?;
        scrape_size(&page)
            .ok_or_else(|| ToolError::metadata(&self.name, "unable to scrape blob size"))
    }
}

impl ToolSource for GitilesFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, version: &str) -> Result<ArtifactMetadata> {
        let version = if version == "latest" {
            self.latest_version().await?
        } else {
            version.to_string()
        };
        let url = self.blob_url(&version);
        let size = self.blob_size(&url).await?;
        debug!(tool = self.name, version, size, "resolved gitiles blob");
        Ok(ArtifactMetadata {
            file_name: self.file_name().to_string(),
            version,
            url,
            content_type: None,
            size: Some(size),
            hash: None,
        })
    }

    fn decoder(&self) -> Option<Box<dyn Decoder>> {
        Some(Box::new(Base64Decoder::new()))
    }

    async fn validate(&self, path: &Path, meta: &ArtifactMetadata) -> Result<bool> {
        if !path.is_file() {
            return Ok(false);
        }
        let metadata_url = swap_format(&meta.url, "JSON");
        let response = self.client.get(&metadata_url).send().await?;
        let body = check_response(response)?.text().await?;
        let value: serde_json::Value = serde_json::from_str(strip_xssi(&body))
            .map_err(|e| ToolError::metadata(&self.name, format!("bad blob metadata: {e}")))?;
        let id = value["id"].as_str().ok_or_else(|| {
            ToolError::metadata(&self.name, "blob metadata carries no object id")
        })?;
        let expected = hex::decode(id)
            .map_err(|e| ToolError::metadata(&self.name, format!("bad object id: {e}")))?;
        Ok(git_blob_sha1(path).await? == expected)
    }
}
