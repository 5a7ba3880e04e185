use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{App, Commands, PatchArgs};
use crate::config::Config;
use crate::patcher::Patcher;
use crate::patches::{AllowUserCerts, Patch, RenamePackage};

mod cli;
mod config;
mod keys;
mod localizable;
mod patcher;
mod patches;
mod progress;
mod provider;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let app = App::parse();
    match app.cmd {
        Commands::Setup => {
            let config = Config::load()?;
            let patcher = Patcher::bootstrap(config).await?;
            println!("java: {}", patcher.java().java_bin().display());
            println!("android.jar: {}", patcher.android_jar().jar_path().display());
            println!("toolchain ready");
        }
        Commands::Patch(args) => patch(args).await?,
        Commands::Convert(args) => {
            let output = localizable::convert_file(&args.file)?;
            println!("wrote {}", output.display());
        }
    }
    Ok(())
}

async fn patch(args: PatchArgs) -> Result<()> {
    let config = Config::load()?;
    let patcher = Patcher::bootstrap(config).await?;

    let apk = patcher.load_apk(&args.package).await?;
    patcher.unpack(&apk, args.clean).await?;

    let mut patches: Vec<Box<dyn Patch>> = Vec::new();
    if args.allow_user_certs {
        patches.push(Box::new(AllowUserCerts));
    }
    if let Some(new_name) = &args.rename {
        patches.push(Box::new(RenamePackage::new(new_name)));
    }
    for patch in &patches {
        patcher.apply_patch(&apk, patch.as_ref())?;
    }

    patcher.pack(&apk, args.debuggable, args.clean).await?;
    patcher.sign(&apk).await?;

    println!("signed apk: {}", apk.signed_path.display());
    Ok(())
}
