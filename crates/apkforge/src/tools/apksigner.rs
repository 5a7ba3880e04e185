//! apksigner: sign the rebuilt APK.
//!
//! The jar is not released anywhere convenient, so it comes straight out
//! of the AOSP build-tools prebuilts on android.googlesource.com.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use tracing::debug;

use apkforge_fetch::HttpClient;
use apkforge_tool::exec::{self, ExecOutput};
use apkforge_tool::source::gitiles::GitilesFile;
use apkforge_tool::{Artifact, SetupContext, Tool};

use crate::tools::Java;

const BUILD_TOOLS_LISTING: &str =
    "https://android.googlesource.com/platform/prebuilts/fullsdk-linux/build-tools/";

pub struct ApkSigner {
    java: Arc<Java>,
    artifact: Artifact<GitilesFile>,
}

impl ApkSigner {
    pub async fn resolve(
        java: Arc<Java>,
        root: impl Into<PathBuf>,
        version: &str,
    ) -> apkforge_tool::Result<Self> {
        let source = GitilesFile::new("apksigner", BUILD_TOOLS_LISTING, "lib/apksigner.jar");
        let artifact = Artifact::resolve(source, root, version).await?;
        Ok(Self { java, artifact })
    }

    pub fn jar_path(&self) -> PathBuf {
        self.artifact.file_path()
    }

    fn version_args(&self) -> [OsString; 3] {
        ["-jar".into(), self.jar_path().into_os_string(), "--version".into()]
    }

    /// Sign `input_apk` into `output_apk`. v4 signing is off: it emits a
    /// sidecar file the install flow has no use for.
    pub async fn sign_apk(
        &self,
        input_apk: &Path,
        output_apk: &Path,
        key: &Path,
        cert: &Path,
    ) -> anyhow::Result<ExecOutput> {
        let args: Vec<OsString> = vec![
            "-jar".into(),
            self.jar_path().into_os_string(),
            "sign".into(),
            "--key".into(),
            key.into(),
            "--cert".into(),
            cert.into(),
            "--v4-signing-enabled".into(),
            "false".into(),
            "--in".into(),
            input_apk.into(),
            "--out".into(),
            output_apk.into(),
        ];
        let output = self.java.run(args).await?;
        for line in &output.lines {
            debug!(target: "apksigner", "{line}");
        }
        if !output.success() {
            bail!(
                "apksigner exited with code {}:\n{}",
                output.code,
                output.lines.join("\n")
            );
        }
        Ok(output)
    }
}

impl Tool for ApkSigner {
    fn name(&self) -> &str {
        "apksigner"
    }

    async fn is_ready(&self) -> bool {
        if !self.artifact.is_valid().await.unwrap_or(false) {
            return false;
        }
        self.java
            .run(self.version_args())
            .await
            .map(|out| out.success())
            .unwrap_or(false)
    }

    async fn setup<C: HttpClient>(
        &mut self,
        ctx: &SetupContext<'_, C>,
    ) -> apkforge_tool::Result<()> {
        self.artifact.acquire(ctx.client, ctx.progress()).await?;
        exec::self_test("apksigner", self.java.java_bin(), self.version_args()).await?;
        Ok(())
    }
}
