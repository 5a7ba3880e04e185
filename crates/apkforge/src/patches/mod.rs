//! Patches applied to the unpacked bundle before repacking.

mod network_security;
mod rename_package;

pub use apkforge_patch::{Patch, PatchError};
pub use network_security::AllowUserCerts;
pub use rename_package::RenamePackage;

pub(crate) const MANIFEST: &str = "AndroidManifest.xml";
