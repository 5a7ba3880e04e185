//! Reversible patches over an unpacked application bundle.
//!
//! Every patch addresses files relative to the bundle root and keeps a
//! one-generation backup sibling per touched file. The backup's existence
//! is the sole source of truth for "this file has a pending patch": it is
//! created before the first apply, consulted to recover from an
//! interrupted apply, and deliberately kept after unapply so the engine
//! can detect and safely re-apply across process restarts.
//!
//! Patches editing the same file are not composable in arbitrary order:
//! each backup snapshots whatever content the patch first saw, so shared
//! targets must be applied and unapplied in LIFO order.

mod error;
mod region;

use std::path::Path;

pub use error::{PatchError, Result};
pub use region::{RegionPatch, region_bounds};

/// A reversible mutation of the unpacked bundle.
pub trait Patch {
    fn name(&self) -> &'static str;

    /// Apply to the bundle rooted at `root`. Must be safe to call twice:
    /// a second apply restores pristine content first and re-applies.
    fn apply(&self, root: &Path) -> Result<()>;

    /// Revert. A no-op when the patch was never applied or the target has
    /// vanished; safe to call repeatedly.
    fn unapply(&self, root: &Path) -> Result<()>;
}

/// On-disk backup record helpers, shared by the region engine and by
/// hand-written patches.
pub mod backup {
    use std::path::{Path, PathBuf};

    use super::Result;

    /// Deterministic backup sibling: `<target>.<PatchName>.backup`.
    pub fn path(patch: &str, target: &Path) -> PathBuf {
        let mut name = target.as_os_str().to_os_string();
        name.push(format!(".{patch}.backup"));
        PathBuf::from(name)
    }

    pub fn exists(patch: &str, target: &Path) -> bool {
        path(patch, target).exists()
    }

    /// Snapshot `target` unless a backup already exists. Exactly one
    /// outstanding backup per (patch, file) pair.
    pub fn create(patch: &str, target: &Path) -> Result<()> {
        let backup = path(patch, target);
        if !backup.exists() {
            std::fs::copy(target, backup)?;
        }
        Ok(())
    }

    /// Overwrite `target` with its backup content. No-op when either file
    /// is missing. The backup stays in place.
    pub fn restore(patch: &str, target: &Path) -> Result<()> {
        let backup = path(patch, target);
        if !target.exists() || !backup.exists() {
            return Ok(());
        }
        std::fs::copy(backup, target)?;
        Ok(())
    }
}
