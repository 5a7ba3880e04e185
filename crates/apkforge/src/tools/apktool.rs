//! apktool: unpack and repack APK bundles.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use tracing::debug;

use apkforge_fetch::HttpClient;
use apkforge_tool::exec::{self, ExecOutput};
use apkforge_tool::source::github::{AssetFilter, GithubRelease};
use apkforge_tool::{Artifact, SetupContext, Tool};

use crate::tools::Java;

const APKTOOL_REPO: &str = "iBotPeaches/Apktool";
const JAR_MIME: &str = "application/x-java-archive";

pub struct ApkTool {
    java: Arc<Java>,
    artifact: Artifact<GithubRelease>,
}

impl ApkTool {
    pub async fn resolve(
        java: Arc<Java>,
        root: impl Into<PathBuf>,
        version: &str,
    ) -> apkforge_tool::Result<Self> {
        let source = GithubRelease::new(
            "apktool",
            APKTOOL_REPO,
            AssetFilter::ContentType(JAR_MIME.to_string()),
        );
        let artifact = Artifact::resolve(source, root, version).await?;
        Ok(Self { java, artifact })
    }

    pub fn jar_path(&self) -> PathBuf {
        self.artifact.file_path()
    }

    async fn run_jar(&self, args: Vec<OsString>) -> anyhow::Result<ExecOutput> {
        let mut full: Vec<OsString> = vec!["-jar".into(), self.jar_path().into_os_string()];
        full.extend(args);
        let output = self.java.run(full).await?;
        for line in &output.lines {
            debug!(target: "apktool", "{line}");
        }
        if !output.success() {
            bail!(
                "apktool exited with code {}:\n{}",
                output.code,
                output.lines.join("\n")
            );
        }
        Ok(output)
    }

    /// Decode an APK into a directory tree.
    pub async fn unpack_apk(&self, apk: &Path, output_dir: &Path) -> anyhow::Result<ExecOutput> {
        let args: Vec<OsString> = vec![
            "d".into(),
            "--output".into(),
            output_dir.into(),
            "--no-debug-info".into(),
            "--force".into(),
            apk.into(),
        ];
        self.run_jar(args).await
    }

    /// Build an APK back from a decoded directory tree.
    pub async fn pack_apk(
        &self,
        input_dir: &Path,
        output_apk: &Path,
        rebuild_all: bool,
        debuggable: bool,
    ) -> anyhow::Result<ExecOutput> {
        let mut args: Vec<OsString> = vec![
            "b".into(),
            "--output".into(),
            output_apk.into(),
            "--use-aapt2".into(),
        ];
        if rebuild_all {
            args.push("--force-all".into());
        }
        if debuggable {
            args.push("--debug".into());
        }
        args.push(input_dir.into());
        self.run_jar(args).await
    }
}

impl Tool for ApkTool {
    fn name(&self) -> &str {
        "apktool"
    }

    async fn is_ready(&self) -> bool {
        if !self.artifact.is_valid().await.unwrap_or(false) {
            return false;
        }
        self.java
            .run(["-jar".into(), self.jar_path().into_os_string(), "--version".into()])
            .await
            .map(|out| out.success())
            .unwrap_or(false)
    }

    async fn setup<C: HttpClient>(
        &mut self,
        ctx: &SetupContext<'_, C>,
    ) -> apkforge_tool::Result<()> {
        self.artifact.acquire(ctx.client, ctx.progress()).await?;
        exec::self_test(
            "apktool",
            self.java.java_bin(),
            ["-jar".into(), self.jar_path().into_os_string(), "--version".into()],
        )
        .await?;
        Ok(())
    }
}
