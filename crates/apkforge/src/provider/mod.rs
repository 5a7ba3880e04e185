//! Where APKs come from.

mod qooapp;

use std::path::Path;

use anyhow::{Result, bail};

use apkforge_progress::ProgressFn;
use apkforge_tool::hash;

pub use qooapp::QooApp;

pub const COMMON_ABI: &[&str] = &["armeabi-v7a"];
pub const COMMON_MIN_SDK: u32 = 21;

/// Resolved download descriptor for one app version.
#[derive(Debug, Clone)]
pub struct ApkInfo {
    pub package_name: String,
    pub version_name: String,
    pub version_code: i64,
    pub sdk_version: u32,
    pub abis: Vec<String>,
    /// MD5 of the base APK, when the provider reports one.
    pub file_md5: Option<Vec<u8>>,
    pub file_size: Option<u64>,
}

/// A store that can describe and serve APKs by package name.
pub trait ApkProvider {
    fn fetch_info(
        &self,
        package_name: &str,
        sdk_version: u32,
        abis: &[&str],
    ) -> impl std::future::Future<Output = Result<ApkInfo>> + Send;

    fn download_apk(
        &self,
        info: &ApkInfo,
        destination: &Path,
        on_progress: Option<ProgressFn>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Check a downloaded APK against the info it was fetched from: by MD5
/// when the provider gave one, by size otherwise. An info carrying
/// neither cannot be validated and is an error.
pub async fn is_download_valid(path: &Path, info: &ApkInfo) -> Result<bool> {
    if let Some(expected) = &info.file_md5 {
        return Ok(&hash::file_md5(path).await? == expected);
    }
    if let Some(expected) = info.file_size {
        return Ok(tokio::fs::metadata(path).await?.len() == expected);
    }
    bail!(
        "unable to validate {}: provider reported neither hash nor size",
        info.package_name
    );
}
