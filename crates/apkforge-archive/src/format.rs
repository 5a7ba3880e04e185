use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{ArchiveError, Result};

/// Container formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar(Compression),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

const ZIP_MAGIC: [u8; 2] = [0x50, 0x4b];
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const TAR_MAGIC_OFFSET: usize = 257;
const TAR_MAGIC: &[u8; 5] = b"ustar";

/// Sniff the container format from file magic.
pub fn detect(path: &Path) -> Result<ArchiveFormat> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 262];
    let read = read_up_to(&mut file, &mut header)?;
    let header = &header[..read];

    if header.len() >= 2 && header[..2] == ZIP_MAGIC {
        return Ok(ArchiveFormat::Zip);
    }
    if header.len() >= 2 && header[..2] == GZIP_MAGIC {
        return Ok(ArchiveFormat::Tar(Compression::Gzip));
    }
    if header.len() >= TAR_MAGIC_OFFSET + TAR_MAGIC.len()
        && &header[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len()] == TAR_MAGIC
    {
        return Ok(ArchiveFormat::Tar(Compression::None));
    }

    Err(ArchiveError::Unsupported)
}

fn read_up_to(file: &mut File, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
