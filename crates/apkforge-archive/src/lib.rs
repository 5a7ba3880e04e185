//! Archive member extraction with wrapper-directory stripping.
//!
//! Supports zip and (optionally gzipped) tar containers. Extraction only
//! materializes regular files — directories are implicit — and when every
//! member sits under a single top-level directory that wrapper is stripped,
//! so `tool-1.2.3/bin/tool` lands at `<dest>/bin/tool`. Progress is
//! forwarded per member through an [`apkforge_progress::Reporter`].

mod error;
mod format;

use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use apkforge_progress::{ProgressUnit, Reporter};
use flate2::read::GzDecoder;

pub use error::{ArchiveError, Result};
pub use format::{ArchiveFormat, Compression, detect};

/// A validated on-disk archive.
pub struct Archive {
    path: PathBuf,
    format: ArchiveFormat,
}

impl Archive {
    /// Open `path`, sniffing its container format.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = format::detect(&path)?;
        Ok(Self { path, format })
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Extract every regular file into `dest`.
    ///
    /// The progress sequence counts archive members; directory members are
    /// skipped without a delta. An empty archive produces no events at all.
    pub fn extract_all(&self, dest: &Path, reporter: &mut Reporter) -> Result<()> {
        let names = self.member_names()?;
        if names.is_empty() {
            return Ok(());
        }

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        reporter.begin(
            format!("unpacking {file_name}"),
            ProgressUnit::Generic,
            Some(names.len() as u64),
        )?;

        let wrapper = common_wrapper(&names);
        match self.format {
            ArchiveFormat::Zip => self.extract_zip(dest, wrapper.as_deref(), reporter)?,
            ArchiveFormat::Tar(_) => self.extract_tar(dest, wrapper.as_deref(), reporter)?,
        }

        reporter.finish();
        Ok(())
    }

    fn member_names(&self) -> Result<Vec<String>> {
        match self.format {
            ArchiveFormat::Zip => {
                let archive = zip::ZipArchive::new(File::open(&self.path)?)
                    .map_err(|_| ArchiveError::Corrupted)?;
                Ok(archive.file_names().map(str::to_string).collect())
            }
            ArchiveFormat::Tar(compression) => {
                let mut archive = tar::Archive::new(self.tar_reader(compression)?);
                let mut names = Vec::new();
                for entry in archive.entries().map_err(|_| ArchiveError::Corrupted)? {
                    let entry = entry.map_err(|_| ArchiveError::Corrupted)?;
                    names.push(entry.path()?.to_string_lossy().into_owned());
                }
                Ok(names)
            }
        }
    }

    fn tar_reader(&self, compression: Compression) -> Result<Box<dyn Read>> {
        let file = File::open(&self.path)?;
        Ok(match compression {
            Compression::None => Box::new(file),
            Compression::Gzip => Box::new(GzDecoder::new(file)),
        })
    }

    fn extract_zip(
        &self,
        dest: &Path,
        wrapper: Option<&str>,
        reporter: &mut Reporter,
    ) -> Result<()> {
        let mut archive =
            zip::ZipArchive::new(File::open(&self.path)?).map_err(|_| ArchiveError::Corrupted)?;
        for index in 0..archive.len() {
            let mut member = archive.by_index(index).map_err(|_| ArchiveError::Corrupted)?;
            if member.is_dir() {
                continue;
            }
            let raw_path = member.enclosed_name().ok_or(ArchiveError::InvalidPath)?;
            let Some(target) = member_target(dest, &raw_path, wrapper)? else {
                continue;
            };
            write_member(&mut member, &target)?;
            reporter.advance(1)?;
        }
        Ok(())
    }

    fn extract_tar(
        &self,
        dest: &Path,
        wrapper: Option<&str>,
        reporter: &mut Reporter,
    ) -> Result<()> {
        let ArchiveFormat::Tar(compression) = self.format else {
            return Err(ArchiveError::Unsupported);
        };
        let mut archive = tar::Archive::new(self.tar_reader(compression)?);
        for entry in archive.entries().map_err(|_| ArchiveError::Corrupted)? {
            let mut entry = entry.map_err(|_| ArchiveError::Corrupted)?;
            if entry.header().entry_type().is_dir() {
                continue;
            }
            if !entry.header().entry_type().is_file() {
                // Symlinks and specials are not part of the tool bundles
                // we unpack; skip rather than materialize surprises.
                continue;
            }
            let raw_path = entry.path()?.into_owned();
            let Some(target) = member_target(dest, &raw_path, wrapper)? else {
                continue;
            };
            write_member(&mut entry, &target)?;
            reporter.advance(1)?;
        }
        Ok(())
    }
}

/// When every member path starts with the first member's path, that first
/// path is a wrapping top-level directory to strip.
fn common_wrapper(names: &[String]) -> Option<String> {
    if names.len() < 2 {
        return None;
    }
    let wrapper = &names[0];
    names
        .iter()
        .all(|name| name.starts_with(wrapper.as_str()))
        .then(|| wrapper.clone())
}

/// Resolve a member's destination path, stripping `wrapper` and rejecting
/// traversal components. Returns `None` for members that vanish entirely
/// after stripping (the wrapper directory itself).
fn member_target(dest: &Path, raw: &Path, wrapper: Option<&str>) -> Result<Option<PathBuf>> {
    let relative = match wrapper {
        Some(wrapper) => match raw.strip_prefix(wrapper.trim_end_matches('/')) {
            Ok(stripped) => stripped,
            Err(_) => raw,
        },
        None => raw,
    };
    if relative.as_os_str().is_empty() {
        return Ok(None);
    }
    for component in relative.components() {
        match component {
            Component::Normal(_) => {}
            Component::CurDir => {}
            _ => return Err(ArchiveError::InvalidPath),
        }
    }
    Ok(Some(dest.join(relative)))
}

fn write_member(reader: &mut impl Read, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = File::create(target)?;
    io::copy(reader, &mut out)?;
    Ok(())
}
