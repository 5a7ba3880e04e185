//! Trust user-installed CA certificates.
//!
//! Drops a network security config that accepts system and user trust
//! anchors (and cleartext traffic) and points the manifest's
//! `<application>` element at it. This is what lets a proxy with a
//! user-installed certificate observe the app's TLS traffic.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use apkforge_patch::{Patch, PatchError, Result, backup};

use crate::patches::MANIFEST;

const CONFIG_PATH: &str = "res/xml/network_security_config.xml";

const CONFIG_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<network-security-config>
    <base-config cleartextTrafficPermitted="true">
        <trust-anchors>
            <certificates src="system" overridePins="true" />
            <certificates src="user" overridePins="true" />
        </trust-anchors>
    </base-config>
</network-security-config>
"#;

const CONFIG_ATTR: &str = r#"android:networkSecurityConfig="@xml/network_security_config""#;

static RE_APPLICATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<application\b").unwrap());

pub struct AllowUserCerts;

impl Patch for AllowUserCerts {
    fn name(&self) -> &'static str {
        "AllowUserCerts"
    }

    fn apply(&self, root: &Path) -> Result<()> {
        let config = root.join(CONFIG_PATH);
        if let Some(parent) = config.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config, CONFIG_XML)?;

        let manifest = root.join(MANIFEST);
        if !manifest.is_file() {
            return Err(PatchError::incomplete(
                self.name(),
                format!("{MANIFEST} not found in bundle"),
            ));
        }
        backup::restore(self.name(), &manifest)?;
        backup::create(self.name(), &manifest)?;

        let content = std::fs::read_to_string(&manifest)?;
        if !RE_APPLICATION.is_match(&content) {
            return Err(PatchError::incomplete(
                self.name(),
                "manifest has no application element",
            ));
        }
        let patched = RE_APPLICATION
            .replace(&content, format!("<application {CONFIG_ATTR}"))
            .into_owned();
        std::fs::write(&manifest, patched)?;
        Ok(())
    }

    fn unapply(&self, root: &Path) -> Result<()> {
        let config = root.join(CONFIG_PATH);
        if config.exists() {
            std::fs::remove_file(config)?;
        }
        backup::restore(self.name(), &root.join(MANIFEST))
    }
}
