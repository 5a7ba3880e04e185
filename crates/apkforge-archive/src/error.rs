use std::io;

use apkforge_progress::Cancelled;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("unsupported archive type")]
    Unsupported,

    #[error("archive is corrupted")]
    Corrupted,

    #[error("entry path escapes the extraction root")]
    InvalidPath,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
