//! The platform android.jar, fetched from the AOSP SDK prebuilts.
//!
//! Only the system variant of API 29 carries the hidden-API surface the
//! patches compile against, so version selection is restricted to it.

use std::path::PathBuf;

use apkforge_fetch::HttpClient;
use apkforge_tool::source::gitiles::GitilesFile;
use apkforge_tool::{Artifact, SetupContext, Tool};

const PLATFORMS_LISTING: &str =
    "https://android.googlesource.com/platform/prebuilts/fullsdk/platforms/";

const USABLE_VERSIONS: &[&str] = &["android-system-29"];

pub struct AndroidJar {
    artifact: Artifact<GitilesFile>,
}

impl AndroidJar {
    pub async fn resolve(
        root: impl Into<PathBuf>,
        version: &str,
    ) -> apkforge_tool::Result<Self> {
        let source = GitilesFile::new("android_jar", PLATFORMS_LISTING, "android.jar")
            .allowed_versions(USABLE_VERSIONS.iter().copied());
        let artifact = Artifact::resolve(source, root, version).await?;
        Ok(Self { artifact })
    }

    pub fn jar_path(&self) -> PathBuf {
        self.artifact.file_path()
    }
}

impl Tool for AndroidJar {
    fn name(&self) -> &str {
        "android_jar"
    }

    // The jar is a library, nothing to execute. Blob-hash validation is
    // the whole readiness story.
    async fn is_ready(&self) -> bool {
        self.artifact.is_valid().await.unwrap_or(false)
    }

    async fn setup<C: HttpClient>(
        &mut self,
        ctx: &SetupContext<'_, C>,
    ) -> apkforge_tool::Result<()> {
        self.artifact.acquire(ctx.client, ctx.progress()).await
    }
}
