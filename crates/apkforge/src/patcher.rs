//! The pipeline: provision tools, fetch the APK, unpack, patch, repack,
//! sign.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use tracing::info;

use apkforge_fetch::ReqwestClient;
use apkforge_tool::{SetupContext, Tool, ensure_ready};

use crate::config::Config;
use crate::keys;
use crate::patches::Patch;
use crate::progress;
use crate::provider::{ApkInfo, ApkProvider, COMMON_ABI, COMMON_MIN_SDK, QooApp, is_download_valid};
use crate::tools::{AndroidJar, ApkSigner, ApkTool, Java};

/// One loaded app version and the file paths of every pipeline stage.
#[derive(Debug)]
pub struct LoadedApk {
    pub info: ApkInfo,
    pub file_path: PathBuf,
    pub loaded_at: DateTime<Utc>,
    pub unpack_dir: PathBuf,
    pub pack_path: PathBuf,
    pub signed_path: PathBuf,
}

pub struct Patcher {
    config: Config,
    java: Arc<Java>,
    apktool: ApkTool,
    apksigner: ApkSigner,
    android_jar: AndroidJar,
    qooapp: QooApp,
}

impl Patcher {
    /// Provision every tool and credential the pipeline needs. Tools
    /// that are already ready are not touched; generated credentials
    /// are persisted back into the config file.
    pub async fn bootstrap(mut config: Config) -> Result<Self> {
        keys::ensure_signing_material(&config.sign_key(), &config.sign_cert())?;

        let client = ReqwestClient::new();
        let ctx = SetupContext::new(&client).on_progress(progress::console_progress());

        info!("initializing java");
        let mut java = Java::locate(config.jre_dir(), config.jdk_dir(), &config.tools.java)
            .await
            .context("failed to resolve java")?;
        ensure_ready(&mut java, &ctx).await?;
        let java = Arc::new(java);

        info!("initializing apktool");
        let mut apktool =
            ApkTool::resolve(java.clone(), config.apktool_dir(), &config.tools.apktool)
                .await
                .context("failed to resolve apktool")?;
        ensure_ready(&mut apktool, &ctx).await?;

        info!("initializing apksigner");
        let mut apksigner =
            ApkSigner::resolve(java.clone(), config.apksigner_dir(), &config.tools.apksigner)
                .await
                .context("failed to resolve apksigner")?;
        ensure_ready(&mut apksigner, &ctx).await?;

        info!("initializing android.jar");
        let mut android_jar =
            AndroidJar::resolve(config.android_jar_dir(), &config.tools.android_jar)
                .await
                .context("failed to resolve android.jar")?;
        ensure_ready(&mut android_jar, &ctx).await?;

        info!("initializing qooapp");
        let mut qooapp = QooApp::new(
            config.qooapp.device_id.clone(),
            config.qooapp.token.clone(),
        );
        ensure_ready(&mut qooapp, &ctx).await?;
        if config.qooapp.device_id.as_deref() != qooapp.device_id()
            || config.qooapp.token.as_deref() != qooapp.token()
        {
            config.qooapp.device_id = qooapp.device_id().map(str::to_string);
            config.qooapp.token = qooapp.token().map(str::to_string);
            config.persist().context("failed to persist credentials")?;
        }

        Ok(Self {
            config,
            java,
            apktool,
            apksigner,
            android_jar,
            qooapp,
        })
    }

    pub fn java(&self) -> &Java {
        &self.java
    }

    pub fn android_jar(&self) -> &AndroidJar {
        &self.android_jar
    }

    /// Fetch info for a package and bring its APK on disk, reusing a
    /// previous download when it still validates.
    pub async fn load_apk(&self, package_name: &str) -> Result<LoadedApk> {
        let info = self
            .qooapp
            .fetch_info(package_name, COMMON_MIN_SDK, COMMON_ABI)
            .await?;

        let version_dir = self
            .config
            .apks_dir()
            .join(&info.package_name)
            .join(&info.version_name);
        let file_path = version_dir.join(format!("{}.apk", info.package_name));

        if !file_path.exists() {
            info!(package = info.package_name, version = info.version_name, "downloading apk");
            tokio::fs::create_dir_all(&version_dir).await?;
            self.qooapp
                .download_apk(&info, &file_path, Some(progress::console_progress()))
                .await?;
        }
        if !is_download_valid(&file_path, &info).await? {
            bail!("downloaded apk for {} failed validation", info.package_name);
        }

        let loaded_at = Utc::now();
        let stem = format!(
            "{}-{}-{}",
            info.package_name,
            info.version_name,
            loaded_at.timestamp()
        );
        Ok(LoadedApk {
            unpack_dir: version_dir.join(&info.package_name),
            pack_path: version_dir.join(format!("{stem}.apk")),
            signed_path: version_dir.join(format!("{stem}.signed.apk")),
            info,
            file_path,
            loaded_at,
        })
    }

    /// Decode the APK. An existing unpack directory is reused unless
    /// `clean` forces a fresh decode.
    pub async fn unpack(&self, apk: &LoadedApk, clean: bool) -> Result<()> {
        if apk.unpack_dir.exists() {
            if !clean {
                info!("reusing existing unpacked bundle");
                return Ok(());
            }
            info!("deleting existing unpacked bundle");
            tokio::fs::remove_dir_all(&apk.unpack_dir).await?;
        }
        self.apktool.unpack_apk(&apk.file_path, &apk.unpack_dir).await?;
        Ok(())
    }

    /// Apply one patch to the unpacked bundle.
    pub fn apply_patch(&self, apk: &LoadedApk, patch: &dyn Patch) -> Result<()> {
        if !apk.unpack_dir.exists() {
            bail!("unable to apply {}: apk has not been unpacked", patch.name());
        }
        info!(patch = patch.name(), "applying patch");
        patch.apply(&apk.unpack_dir)?;
        Ok(())
    }

    pub async fn pack(&self, apk: &LoadedApk, debuggable: bool, rebuild_all: bool) -> Result<()> {
        self.apktool
            .pack_apk(&apk.unpack_dir, &apk.pack_path, rebuild_all, debuggable)
            .await?;
        Ok(())
    }

    pub async fn sign(&self, apk: &LoadedApk) -> Result<()> {
        self.apksigner
            .sign_apk(
                &apk.pack_path,
                &apk.signed_path,
                &self.config.sign_key(),
                &self.config.sign_cert(),
            )
            .await?;
        Ok(())
    }
}
