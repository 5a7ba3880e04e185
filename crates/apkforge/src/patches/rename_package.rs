//! Rename the application package.
//!
//! A renamed APK installs alongside the original instead of replacing
//! it. The old package name is read from the manifest's `package`
//! attribute and every occurrence in the manifest is rewritten, so
//! relative component names keep resolving.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use apkforge_patch::{Patch, PatchError, Result, backup};

use crate::patches::MANIFEST;

static RE_PACKAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"package="([^"]+)""#).unwrap());

pub struct RenamePackage {
    new_package_name: String,
}

impl RenamePackage {
    pub fn new(new_package_name: impl Into<String>) -> Self {
        Self {
            new_package_name: new_package_name.into(),
        }
    }
}

impl Patch for RenamePackage {
    fn name(&self) -> &'static str {
        "RenamePackage"
    }

    fn apply(&self, root: &Path) -> Result<()> {
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
        let old_package = RE_PACKAGE
            .captures(&content)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| {
                PatchError::incomplete(self.name(), "manifest has no package attribute")
            })?;

        let renamed = content.replace(&old_package, &self.new_package_name);
        std::fs::write(&manifest, renamed)?;
        Ok(())
    }

    fn unapply(&self, root: &Path) -> Result<()> {
        backup::restore(self.name(), &root.join(MANIFEST))
    }
}
