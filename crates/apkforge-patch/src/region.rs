use std::path::Path;

use crate::error::{PatchError, Result};
use crate::{Patch, backup};

/// A patch that rewrites one marker-delimited region of a text file.
///
/// The region spans from the beginning of the first line containing
/// `line_start` through the end of the first later line containing
/// `line_end` — both marker lines included — or to the end of the file
/// when `line_end` is `None`. `replace` must be a pure function of the
/// matched region; it may not assume anything about surrounding content.
pub trait RegionPatch {
    fn name(&self) -> &'static str;

    /// Target file, relative to the bundle root.
    fn target_file(&self) -> &str;

    /// Substring locating the first line of the region.
    fn line_start(&self) -> &str;

    /// Substring locating the last line of the region; `None` extends the
    /// region to end of file.
    fn line_end(&self) -> Option<&str> {
        None
    }

    fn replace(&self, original: &str) -> String;
}

impl<T: RegionPatch> Patch for T {
    fn name(&self) -> &'static str {
        RegionPatch::name(self)
    }

    fn apply(&self, root: &Path) -> Result<()> {
        let target = root.join(self.target_file());
        let name = RegionPatch::name(self);

        if !target.exists() {
            return Err(PatchError::incomplete(
                name,
                format!("unable to find {}", self.target_file()),
            ));
        }

        // A leftover backup means a previous apply ran (or was interrupted
        // after the snapshot). Restore pristine content first so apply is
        // idempotent and crash-safe.
        if backup::exists(name, &target) {
            self.unapply(root)?;
        }
        backup::create(name, &target)?;

        let content = std::fs::read_to_string(&target)?;
        let (start, end) = region_bounds(&content, self.line_start(), self.line_end())
            .ok_or_else(|| {
                PatchError::incomplete(
                    name,
                    format!("unable to locate `{}`", self.line_start()),
                )
            })?;

        let mut patched = String::with_capacity(content.len());
        patched.push_str(&content[..start]);
        patched.push_str(&self.replace(&content[start..end]));
        patched.push_str(&content[end..]);
        std::fs::write(&target, patched)?;
        Ok(())
    }

    fn unapply(&self, root: &Path) -> Result<()> {
        let target = root.join(self.target_file());
        backup::restore(RegionPatch::name(self), &target)
    }
}

/// Locate the byte range of the marker-delimited region.
///
/// Returns `None` when the start marker is absent, or when an end marker
/// is required but never found after the start line.
pub fn region_bounds(content: &str, line_start: &str, line_end: Option<&str>) -> Option<(usize, usize)> {
    let mut start = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let line_close = offset + line.len();
        match start {
            None => {
                if line.contains(line_start) {
                    start = Some(offset);
                    if line_end.is_none() {
                        return Some((offset, content.len()));
                    }
                }
            }
            Some(start) => {
                if let Some(end_marker) = line_end
                    && line.contains(end_marker)
                {
                    return Some((start, line_close));
                }
            }
        }
        offset = line_close;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MarkerPatch {
        replacement: &'static str,
        with_end: bool,
    }

    impl RegionPatch for MarkerPatch {
        fn name(&self) -> &'static str {
            "MarkerPatch"
        }

        fn target_file(&self) -> &str {
            "assets/config.txt"
        }

        fn line_start(&self) -> &str {
            "<!--START-->"
        }

        fn line_end(&self) -> Option<&str> {
            self.with_end.then_some("<!--END-->")
        }

        fn replace(&self, _original: &str) -> String {
            self.replacement.to_string()
        }
    }

    const ORIGINAL: &str = "A\n<!--START-->\nB\n<!--END-->\nC\n";

    fn fixture(content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/config.txt"), content).unwrap();
        dir
    }

    fn read(dir: &tempfile::TempDir) -> String {
        std::fs::read_to_string(dir.path().join("assets/config.txt")).unwrap()
    }

    #[test]
    fn bounds_include_both_marker_lines() {
        let (start, end) = region_bounds(ORIGINAL, "<!--START-->", Some("<!--END-->")).unwrap();
        assert_eq!(&ORIGINAL[start..end], "<!--START-->\nB\n<!--END-->\n");
    }

    #[test]
    fn bounds_without_end_marker_reach_end_of_file() {
        let (start, end) = region_bounds(ORIGINAL, "<!--START-->", None).unwrap();
        assert_eq!(&ORIGINAL[start..end], "<!--START-->\nB\n<!--END-->\nC\n");
    }

    #[test]
    fn bounds_missing_start_marker() {
        assert_eq!(region_bounds("A\nB\n", "<!--START-->", None), None);
    }

    #[test]
    fn bounds_missing_end_marker() {
        assert_eq!(
            region_bounds("A\n<!--START-->\nB\n", "<!--START-->", Some("<!--END-->")),
            None
        );
    }

    #[test]
    fn bounds_on_file_without_trailing_newline() {
        let content = "x\n<!--START-->\ny\n<!--END-->";
        let (start, end) = region_bounds(content, "<!--START-->", Some("<!--END-->")).unwrap();
        assert_eq!(&content[start..end], "<!--START-->\ny\n<!--END-->");
    }

    #[test]
    fn apply_replaces_region_and_unapply_restores() {
        let patch = MarkerPatch {
            replacement: "<!--START-->\nX\n<!--END-->\n",
            with_end: true,
        };
        let dir = fixture(ORIGINAL);

        patch.apply(dir.path()).unwrap();
        assert_eq!(read(&dir), "A\n<!--START-->\nX\n<!--END-->\nC\n");

        patch.unapply(dir.path()).unwrap();
        assert_eq!(read(&dir), ORIGINAL);
    }

    #[test]
    fn apply_twice_equals_apply_once() {
        let patch = MarkerPatch {
            replacement: "<!--START-->\nX\n<!--END-->\n",
            with_end: true,
        };
        let dir = fixture(ORIGINAL);

        patch.apply(dir.path()).unwrap();
        patch.apply(dir.path()).unwrap();
        assert_eq!(read(&dir), "A\n<!--START-->\nX\n<!--END-->\nC\n");

        patch.unapply(dir.path()).unwrap();
        assert_eq!(read(&dir), ORIGINAL);
    }

    #[test]
    fn unapply_twice_is_a_no_op() {
        let patch = MarkerPatch {
            replacement: "<!--START-->\nX\n<!--END-->\n",
            with_end: true,
        };
        let dir = fixture(ORIGINAL);

        patch.apply(dir.path()).unwrap();
        patch.unapply(dir.path()).unwrap();
        patch.unapply(dir.path()).unwrap();
        assert_eq!(read(&dir), ORIGINAL);
    }

    #[test]
    fn unapply_before_any_apply_is_a_no_op() {
        let patch = MarkerPatch {
            replacement: "irrelevant",
            with_end: true,
        };
        let dir = fixture(ORIGINAL);
        patch.unapply(dir.path()).unwrap();
        assert_eq!(read(&dir), ORIGINAL);
    }

    #[test]
    fn interrupted_apply_recovers_from_dangling_backup() {
        let patch = MarkerPatch {
            replacement: "<!--START-->\nX\n<!--END-->\n",
            with_end: true,
        };
        let dir = fixture(ORIGINAL);
        let target = dir.path().join("assets/config.txt");

        // Simulate a crash between backup creation and the rewrite: the
        // backup exists but the target holds half-written junk.
        backup::create("MarkerPatch", &target).unwrap();
        std::fs::write(&target, "A\n<!--START-->\ngarb").unwrap();

        patch.apply(dir.path()).unwrap();
        assert_eq!(read(&dir), "A\n<!--START-->\nX\n<!--END-->\nC\n");
    }

    #[test]
    fn missing_target_is_an_incomplete_patch() {
        let patch = MarkerPatch {
            replacement: "irrelevant",
            with_end: true,
        };
        let dir = tempfile::tempdir().unwrap();
        let err = patch.apply(dir.path()).unwrap_err();
        assert!(matches!(err, PatchError::Incomplete { patch: "MarkerPatch", .. }));
    }

    #[test]
    fn missing_marker_is_an_incomplete_patch() {
        let patch = MarkerPatch {
            replacement: "irrelevant",
            with_end: true,
        };
        let dir = fixture("no markers here\n");
        let err = patch.apply(dir.path()).unwrap_err();
        assert!(matches!(err, PatchError::Incomplete { .. }));
        // The failed apply must not leave the file mutated.
        assert_eq!(read(&dir), "no markers here\n");
    }

    #[test]
    fn to_end_of_file_patch() {
        let patch = MarkerPatch {
            replacement: "<!--START-->\ntail\n",
            with_end: false,
        };
        let dir = fixture(ORIGINAL);
        patch.apply(dir.path()).unwrap();
        assert_eq!(read(&dir), "A\n<!--START-->\ntail\n");
        patch.unapply(dir.path()).unwrap();
        assert_eq!(read(&dir), ORIGINAL);
    }
}
