//! QooApp store client.
//!
//! The API is the one the mobile client speaks: an anonymous account is
//! registered from a random device id, and the returned user token
//! authorizes app metadata lookups. Both credentials are persisted so a
//! reinstall keeps looking like the same device.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use tracing::info;

use apkforge_fetch::{ReqwestClient, TransferOptions, transfer};
use apkforge_progress::{ProgressFn, Reporter};
use apkforge_tool::{SetupContext, Tool, ToolError};

use crate::provider::{ApkInfo, ApkProvider};

const API_BASE: &str = "https://api.qoo-app.com";
const CLIENT_VERSION: &str = "8.1.6";
const CLIENT_VERSION_CODE: u32 = 316;

#[derive(Debug, Deserialize)]
struct InfoResponse {
    data: Option<AppData>,
}

#[derive(Debug, Deserialize)]
struct AppData {
    is_apk_ready: bool,
    apk: Option<ApkData>,
}

#[derive(Debug, Deserialize)]
struct ApkData {
    version_name: String,
    version_code: i64,
    base_apk_md5: String,
    dl_compatibility: Option<serde_json::Value>,
    data_pack_needed: bool,
    obb: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

fn build_info(
    package_name: &str,
    sdk_version: u32,
    abis: &[&str],
    response: InfoResponse,
) -> Result<ApkInfo> {
    let data = response
        .data
        .ok_or_else(|| anyhow!("no data for {package_name}"))?;

    if let Some(apk) = &data.apk {
        if apk.dl_compatibility.is_some() {
            bail!("{package_name} is not compatible with the selected sdk version and/or abis");
        }
    }
    if !data.is_apk_ready {
        bail!("{package_name} is not available for download");
    }
    let apk = data
        .apk
        .ok_or_else(|| anyhow!("no apk descriptor for {package_name}"))?;
    if apk.data_pack_needed || apk.obb.is_some() {
        bail!("split apks are not supported");
    }

    let file_md5 = hex::decode(&apk.base_apk_md5)
        .with_context(|| format!("bad apk md5 for {package_name}"))?;

    Ok(ApkInfo {
        package_name: package_name.to_string(),
        version_name: apk.version_name,
        version_code: apk.version_code,
        sdk_version,
        abis: abis.iter().map(|s| s.to_string()).collect(),
        file_md5: Some(file_md5),
        file_size: None,
    })
}

pub struct QooApp {
    device_id: Option<String>,
    token: Option<String>,
    client: reqwest::Client,
}

impl QooApp {
    pub fn new(device_id: Option<String>, token: Option<String>) -> Self {
        Self {
            device_id,
            token,
            client: reqwest::Client::new(),
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn generate_device_id() -> String {
        hex::encode(rand::random::<[u8; 8]>())
    }

    fn identity_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![(
            "user-agent".to_string(),
            format!("QooApp {CLIENT_VERSION}"),
        )];
        if let Some(device_id) = &self.device_id {
            headers.push(("device-id".to_string(), device_id.clone()));
        }
        headers
    }

    async fn register_token(&self) -> Result<String> {
        let device_id = self
            .device_id
            .as_deref()
            .ok_or_else(|| anyhow!("device id must exist before token registration"))?;

        let url = format!("{API_BASE}/v6/users?version_code={CLIENT_VERSION_CODE}");
        let form = [
            ("device_id", device_id),
            ("platform_access_token", device_id),
            ("type", "4"),
            ("email", "null"),
            ("version_code", "316"),
        ];
        let mut request = self.client.post(&url).form(&form);
        for (key, value) in self.identity_headers() {
            request = request.header(key, value);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            bail!(
                "unable to register qooapp token: status {}",
                response.status()
            );
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.token)
    }
}

impl ApkProvider for QooApp {
    async fn fetch_info(
        &self,
        package_name: &str,
        sdk_version: u32,
        abis: &[&str],
    ) -> Result<ApkInfo> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("qooapp provider is not set up"))?;

        let url = reqwest::Url::parse_with_params(
            &format!("{API_BASE}/v10/apps/{package_name}"),
            &[
                ("supported_abis", abis.join(",")),
                ("sdk_version", sdk_version.to_string()),
                ("version_code", CLIENT_VERSION_CODE.to_string()),
            ],
        )?;
        let mut request = self.client.get(url).header("x-user-token", token);
        for (key, value) in self.identity_headers() {
            request = request.header(key, value);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            bail!(
                "unable to get info for {package_name}: status {}",
                response.status()
            );
        }
        build_info(package_name, sdk_version, abis, response.json().await?)
    }

    async fn download_apk(
        &self,
        info: &ApkInfo,
        destination: &Path,
        on_progress: Option<ProgressFn>,
    ) -> Result<()> {
        let url = reqwest::Url::parse_with_params(
            &format!("{API_BASE}/v6/apps/{}/download", info.package_name),
            &[
                ("supported_abis", info.abis.join(",")),
                ("sdk_version", info.sdk_version.to_string()),
                ("version_code", CLIENT_VERSION_CODE.to_string()),
                ("base_apk_version", "0".to_string()),
            ],
        )?;

        let mut options = TransferOptions::new();
        for (key, value) in self.identity_headers() {
            options = options.header(key, value);
        }
        let client = ReqwestClient::from_client(self.client.clone());
        let mut reporter = Reporter::new(on_progress);
        transfer(&client, url.as_str(), destination, options, &mut reporter).await?;
        Ok(())
    }
}

impl Tool for QooApp {
    fn name(&self) -> &str {
        "qooapp"
    }

    async fn is_ready(&self) -> bool {
        self.device_id.is_some() && self.token.is_some()
    }

    async fn setup<C: apkforge_fetch::HttpClient>(
        &mut self,
        _ctx: &SetupContext<'_, C>,
    ) -> apkforge_tool::Result<()> {
        if self.device_id.is_none() {
            self.device_id = Some(Self::generate_device_id());
            info!(device_id = self.device_id.as_deref(), "generated qooapp device id");
        }
        if self.token.is_none() {
            let token = self
                .register_token()
                .await
                .map_err(|e| ToolError::metadata("qooapp", e.to_string()))?;
            self.token = Some(token);
        }
        Ok(())
    }
}
