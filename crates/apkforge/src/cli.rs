use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[command(name = "apkforge", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "s", name = "setup", about = "Provision the toolchain and credentials")]
    Setup,

    #[command(alias = "p", name = "patch", about = "Download, patch and re-sign an app")]
    Patch(PatchArgs),

    #[command(
        alias = "c",
        name = "convert",
        about = "Convert a localization table between .strings and .json"
    )]
    Convert(ConvertArgs),
}

#[derive(Clone, Debug, Args)]
pub struct PatchArgs {
    /// Package name of the app to fetch, e.g. com.example.app
    pub package: String,

    /// Discard any previously unpacked bundle and decode from scratch
    #[arg(long)]
    pub clean: bool,

    /// Build the output APK with debugging enabled
    #[arg(long)]
    pub debuggable: bool,

    /// Rename the package so the result installs alongside the original
    #[arg(long, value_name = "PACKAGE")]
    pub rename: Option<String>,

    /// Trust user-installed CA certificates (for traffic inspection)
    #[arg(long)]
    pub allow_user_certs: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ConvertArgs {
    /// A .strings or .json file; the converted sibling is written next to it
    pub file: PathBuf,
}
