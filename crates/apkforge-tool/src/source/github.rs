//! GitHub releases as a tool source.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::hash;
use crate::source::{ArtifactMetadata, ToolSource, check_response};

const API_BASE: &str = "https://api.github.com/repos";

/// MIME types that never hold a runnable artifact, filtered out when
/// matching assets by name prefix. Covers .msi/.pkg installers,
/// .json metadata, signatures and checksum text files.
const UNWANTED_TYPES: &[&str] = &[
    "application/pgp-signature",
    "application/x-msi",
    "application/octet-stream",
    "application/json",
    "text/plain",
];

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    content_type: String,
    size: u64,
    browser_download_url: String,
    /// `sha256:<hex>`, present on newer releases.
    #[serde(default)]
    digest: Option<String>,
}

fn parse_digest(digest: &str) -> Option<Vec<u8>> {
    hex::decode(digest.strip_prefix("sha256:")?).ok()
}

/// How to pick one asset out of a release.
#[derive(Debug, Clone)]
pub enum AssetFilter {
    /// First asset with this exact MIME type.
    ContentType(String),
    /// First asset whose name starts with this prefix, skipping
    /// signature and text assets.
    NamePrefix(String),
}

impl AssetFilter {
    fn matches(&self, asset: &ReleaseAsset) -> bool {
        match self {
            Self::ContentType(wanted) => asset.content_type == *wanted,
            Self::NamePrefix(prefix) => {
                asset.name.starts_with(prefix.as_str())
                    && !UNWANTED_TYPES.contains(&asset.content_type.as_str())
            }
        }
    }
}

/// Tool artifacts published as GitHub release assets.
pub struct GithubRelease {
    name: String,
    /// `owner/repo` slug.
    repo: String,
    filter: AssetFilter,
    unpack: bool,
    client: reqwest::Client,
}

impl GithubRelease {
    pub fn new(name: impl Into<String>, repo: impl Into<String>, filter: AssetFilter) -> Self {
        Self {
            name: name.into(),
            repo: repo.into(),
            filter,
            unpack: false,
            client: reqwest::Client::new(),
        }
    }

    /// Mark the downloaded asset as an archive to extract in place.
    #[must_use]
    pub fn unpack_archive(mut self) -> Self {
        self.unpack = true;
        self
    }

    fn release_url(&self, version: &str) -> String {
        if version == "latest" {
            format!("{API_BASE}/{}/releases/latest", self.repo)
        } else {
            format!("{API_BASE}/{}/releases/tags/{version}", self.repo)
        }
    }
}

fn select_asset<'a>(release: &'a Release, filter: &AssetFilter) -> Option<&'a ReleaseAsset> {
    release.assets.iter().find(|asset| filter.matches(asset))
}

impl ToolSource for GithubRelease {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, version: &str) -> Result<ArtifactMetadata> {
        let url = self.release_url(version);
        debug!(tool = self.name, url, "resolving github release");
        let response = self
            .client
            .get(&url)
            .header("user-agent", "apkforge")
            .header("accept", "application/vnd.github+json")
            .send()
            .await?;
        let release: Release = check_response(response)?.json().await?;

        let asset = select_asset(&release, &self.filter).ok_or_else(|| {
            ToolError::metadata(
                &self.name,
                format!("release {} has no matching asset", release.tag_name),
            )
        })?;

        Ok(ArtifactMetadata {
            file_name: asset.name.clone(),
            version: release.tag_name.trim_start_matches('v').to_string(),
            url: asset.browser_download_url.clone(),
            content_type: Some(asset.content_type.clone()),
            size: Some(asset.size),
            hash: asset.digest.as_deref().and_then(parse_digest),
        })
    }

    fn headers(&self) -> HashMap<String, String> {
        HashMap::from([("user-agent".to_string(), "apkforge".to_string())])
    }

    fn unpack(&self) -> bool {
        self.unpack
    }

    /// Check by asset digest when the release carried one, size otherwise.
    async fn validate(&self, path: &Path, meta: &ArtifactMetadata) -> Result<bool> {
        if !path.is_file() {
            return Ok(false);
        }
        if let Some(expected) = &meta.hash {
            return Ok(&hash::file_sha256(path).await? == expected);
        }
        let Some(expected) = meta.size else {
            return Ok(true);
        };
        let actual = tokio::fs::metadata(path).await?.len();
        Ok(actual == expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_release() -> Release {
        serde_json::from_str(
            r#"{
                "tag_name": "v2.9.3",
                "assets": [
                    {
                        "name": "apktool_2.9.3.jar.asc",
                        "content_type": "application/pgp-signature",
                        "size": 833,
                        "browser_download_url": "https://example.test/apktool_2.9.3.jar.asc"
                    },
                    {
                        "name": "apktool_2.9.3.jar",
                        "content_type": "application/x-java-archive",
                        "size": 21856563,
                        "browser_download_url": "https://example.test/apktool_2.9.3.jar",
                        "digest": "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
                    }
                ]
            }"#,
        )
        .expect("release json")
    }

    #[test]
    fn content_type_filter_picks_the_jar() {
        let release = sample_release();
        let filter = AssetFilter::ContentType("application/x-java-archive".to_string());
        let asset = select_asset(&release, &filter).expect("asset");
        assert_eq!(asset.name, "apktool_2.9.3.jar");
    }

    #[test]
    fn name_prefix_filter_skips_signatures() {
        let release = sample_release();
        let filter = AssetFilter::NamePrefix("apktool".to_string());
        let asset = select_asset(&release, &filter).expect("asset");
        assert_eq!(asset.content_type, "application/x-java-archive");
    }

    #[test]
    fn no_match_yields_none() {
        let release = sample_release();
        let filter = AssetFilter::NamePrefix("openjdk".to_string());
        assert!(select_asset(&release, &filter).is_none());
    }

    #[test]
    fn digest_parses_only_sha256() {
        assert_eq!(
            parse_digest("sha256:00ff"),
            Some(vec![0x00, 0xff])
        );
        assert_eq!(parse_digest("sha512:00ff"), None);
        assert_eq!(parse_digest("sha256:not-hex"), None);
    }

    #[tokio::test]
    async fn digest_validation_beats_size() {
        let source = GithubRelease::new(
            "apktool",
            "iBotPeaches/Apktool",
            AssetFilter::ContentType("application/x-java-archive".to_string()),
        );
        let release = sample_release();
        let asset = select_asset(&release, &source.filter).expect("asset");
        let meta = ArtifactMetadata {
            file_name: asset.name.clone(),
            version: "2.9.3".to_string(),
            url: asset.browser_download_url.clone(),
            content_type: Some(asset.content_type.clone()),
            // deliberately wrong size; the digest decides
            size: Some(999),
            hash: asset.digest.as_deref().and_then(parse_digest),
        };

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(&meta.file_name);
        // sha256("abc") is the digest baked into the fixture
        tokio::fs::write(&path, b"abc").await.expect("write");
        assert!(source.validate(&path, &meta).await.expect("validate"));

        tokio::fs::write(&path, b"tampered").await.expect("write");
        assert!(!source.validate(&path, &meta).await.expect("validate"));
    }

    #[test]
    fn release_urls_for_latest_and_pinned() {
        let source = GithubRelease::new(
            "apktool",
            "iBotPeaches/Apktool",
            AssetFilter::NamePrefix("apktool".to_string()),
        );
        assert_eq!(
            source.release_url("latest"),
            "https://api.github.com/repos/iBotPeaches/Apktool/releases/latest"
        );
        assert_eq!(
            source.release_url("v2.9.3"),
            "https://api.github.com/repos/iBotPeaches/Apktool/releases/tags/v2.9.3"
        );
    }
}
