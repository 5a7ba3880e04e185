//! Persistent configuration.
//!
//! Layered resolution: `APKFORGE_ROOT` beats the config file, the config
//! file beats defaults. Everything lives under one root so a single
//! delete resets the whole installation. Generated state that must
//! survive runs (provider credentials) is written back with [`Config::persist`].

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use home::home_dir;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";

/// Version requests for the managed tools. "latest" pins to whatever
/// the source resolves at setup time; "system" (java only) skips
/// provisioning and uses the host installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolVersions {
    pub java: String,
    pub apktool: String,
    pub apksigner: String,
    pub android_jar: String,
}

impl Default for ToolVersions {
    fn default() -> Self {
        Self {
            java: "latest".to_string(),
            apktool: "latest".to_string(),
            apksigner: "latest".to_string(),
            android_jar: "latest".to_string(),
        }
    }
}

/// QooApp credentials, generated on first run and persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QooAppAuth {
    pub device_id: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    tools: ToolVersions,
    qooapp: QooAppAuth,
    sign_key: Option<PathBuf>,
    sign_cert: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    pub tools: ToolVersions,
    pub qooapp: QooAppAuth,
    sign_key: Option<PathBuf>,
    sign_cert: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let root = match env::var_os("APKFORGE_ROOT") {
            Some(root) => PathBuf::from(root),
            None => home_dir()
                .context("failed to get home directory")?
                .join(".apkforge"),
        };
        Self::load_from(root)
    }

    pub fn load_from(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let file_path = root.join(CONFIG_FILE);
        let file: ConfigFile = if file_path.is_file() {
            let raw = std::fs::read_to_string(&file_path)
                .with_context(|| format!("failed to read {}", file_path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("invalid config at {}", file_path.display()))?
        } else {
            ConfigFile::default()
        };

        Ok(Self {
            root,
            tools: file.tools,
            qooapp: file.qooapp,
            sign_key: file.sign_key,
            sign_cert: file.sign_cert,
        })
    }

    /// Write the current state back to `<root>/config.toml`.
    pub fn persist(&self) -> Result<()> {
        let file = ConfigFile {
            tools: self.tools.clone(),
            qooapp: self.qooapp.clone(),
            sign_key: self.sign_key.clone(),
            sign_cert: self.sign_cert.clone(),
        };
        let raw = toml::to_string_pretty(&file)?;
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.root.join(CONFIG_FILE), raw)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn jre_dir(&self) -> PathBuf {
        self.root.join("java").join("jre")
    }

    pub fn jdk_dir(&self) -> PathBuf {
        self.root.join("java").join("jdk")
    }

    pub fn apktool_dir(&self) -> PathBuf {
        self.root.join("apktool")
    }

    pub fn apksigner_dir(&self) -> PathBuf {
        self.root.join("apksigner")
    }

    pub fn android_jar_dir(&self) -> PathBuf {
        self.root.join("android_jar")
    }

    pub fn apks_dir(&self) -> PathBuf {
        self.root.join("apks")
    }

    pub fn sign_key(&self) -> PathBuf {
        self.sign_key
            .clone()
            .unwrap_or_else(|| self.apksigner_dir().join("key.pk8"))
    }

    pub fn sign_cert(&self) -> PathBuf {
        self.sign_cert
            .clone()
            .unwrap_or_else(|| self.apksigner_dir().join("cert.x509.pem"))
    }
}
