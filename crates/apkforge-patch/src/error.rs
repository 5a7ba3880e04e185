use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    /// A patch could not be applied: missing target file or marker. Always
    /// fatal to that patch application, never silently skipped.
    #[error("{patch}: {detail}")]
    Incomplete { patch: &'static str, detail: String },

    #[error("file I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PatchError {
    pub fn incomplete(patch: &'static str, detail: impl Into<String>) -> Self {
        Self::Incomplete {
            patch,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PatchError>;
