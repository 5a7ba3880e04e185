//! Managed Java runtime (JRE + JDK).
//!
//! Both environments come from the AdoptOpenJDK 8 release binaries,
//! matched by asset-name prefix against the host platform. The version
//! request "system" skips provisioning entirely and trusts whatever
//! `java`/`javac` the PATH resolves.

use std::ffi::OsStr;
use std::path::PathBuf;

use apkforge_fetch::HttpClient;
use apkforge_tool::exec::{self, ExecOutput};
use apkforge_tool::source::github::{AssetFilter, GithubRelease};
use apkforge_tool::{Artifact, Result, SetupContext, Tool, ToolError};

const JAVA_REPO: &str = "AdoptOpenJDK/openjdk8-binaries";

/// Asset-name platform label, e.g. `x64_linux` or `aarch64_linux`.
fn arch_label() -> Result<String> {
    let (arch, os) = match std::env::consts::OS {
        "windows" => {
            let arch = if cfg!(target_pointer_width = "64") {
                "x64"
            } else {
                "x86-32"
            };
            (arch, "windows")
        }
        "linux" => {
            let arch = match std::env::consts::ARCH {
                "arm" => "arm",
                "aarch64" => "aarch64",
                _ => "x64",
            };
            (arch, "linux")
        }
        "macos" => ("x64", "mac"),
        other => {
            return Err(ToolError::metadata(
                "java",
                format!("unsupported platform: {other}"),
            ));
        }
    };
    Ok(format!("{arch}_{os}"))
}

fn exe(binary: &str) -> String {
    if cfg!(windows) {
        format!("{binary}.exe")
    } else {
        binary.to_string()
    }
}

fn release_source(env: &'static str) -> Result<GithubRelease> {
    let prefix = format!("OpenJDK8U-{env}_{}", arch_label()?);
    Ok(GithubRelease::new(env, JAVA_REPO, AssetFilter::NamePrefix(prefix)).unpack_archive())
}

enum Runtime {
    /// Trust the host PATH.
    System,
    Managed {
        jre: Artifact<GithubRelease>,
        jdk: Artifact<GithubRelease>,
    },
}

pub struct Java {
    runtime: Runtime,
}

impl Java {
    pub async fn locate(
        jre_root: impl Into<PathBuf>,
        jdk_root: impl Into<PathBuf>,
        version: &str,
    ) -> Result<Self> {
        if version == "system" {
            return Ok(Self {
                runtime: Runtime::System,
            });
        }
        let jre = Artifact::resolve(release_source("jre")?, jre_root, version).await?;
        let jdk = Artifact::resolve(release_source("jdk")?, jdk_root, version).await?;
        Ok(Self {
            runtime: Runtime::Managed { jre, jdk },
        })
    }

    pub fn java_bin(&self) -> PathBuf {
        match &self.runtime {
            Runtime::System => PathBuf::from(exe("java")),
            Runtime::Managed { jre, .. } => jre.version_dir().join("bin").join(exe("java")),
        }
    }

    pub fn javac_bin(&self) -> PathBuf {
        match &self.runtime {
            Runtime::System => PathBuf::from(exe("javac")),
            Runtime::Managed { jdk, .. } => jdk.version_dir().join("bin").join(exe("javac")),
        }
    }

    /// Run the managed `java` with the given arguments.
    pub async fn run<I, A>(&self, args: I) -> Result<ExecOutput>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        exec::run(self.java_bin(), args).await
    }

    async fn probe(&self, binary: PathBuf, flag: &str) -> bool {
        exec::run(binary, [flag])
            .await
            .map(|out| out.success())
            .unwrap_or(false)
    }
}

impl Tool for Java {
    fn name(&self) -> &str {
        "java"
    }

    async fn is_ready(&self) -> bool {
        if let Runtime::Managed { jre, jdk } = &self.runtime {
            let jre_valid = jre.is_valid().await.unwrap_or(false);
            let jdk_valid = jdk.is_valid().await.unwrap_or(false);
            if !jre_valid || !jdk_valid {
                return false;
            }
        }
        self.probe(self.java_bin(), "-version").await && self.probe(self.javac_bin(), "-version").await
    }

    async fn setup<C: HttpClient>(&mut self, ctx: &SetupContext<'_, C>) -> Result<()> {
        let Runtime::Managed { jre, jdk } = &self.runtime else {
            return Ok(());
        };
        jre.acquire(ctx.client, ctx.progress()).await?;
        exec::self_test("jre", self.java_bin(), ["-version"]).await?;
        jdk.acquire(ctx.client, ctx.progress()).await?;
        exec::self_test("jdk", self.javac_bin(), ["-version"]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_label_matches_host_os() {
        let label = arch_label().expect("label");
        #[cfg(target_os = "linux")]
        assert!(label.ends_with("_linux"));
        #[cfg(target_os = "macos")]
        assert_eq!(label, "x64_mac");
        assert!(label.contains('_'));
    }

    #[test]
    fn system_runtime_uses_path_binaries() {
        let java = Java {
            runtime: Runtime::System,
        };
        assert_eq!(java.java_bin(), PathBuf::from(exe("java")));
        assert_eq!(java.javac_bin(), PathBuf::from(exe("javac")));
    }
}
