//! Versioned tool acquisition, validation and readiness lifecycle.
//!
//! A [`ToolSource`] supplies version resolution, download coordinates and
//! integrity metadata for one upstream service. An [`Artifact`] binds a
//! source to a storage root and a pinned version and runs the acquisition
//! protocol: transfer, re-validate, delete-on-corrupt, optional in-place
//! unpack. The [`Tool`] trait layers the idempotent readiness state
//! machine on top (`is_ready` fast path, `setup` with a mandatory
//! self-test).

mod artifact;
mod error;
pub mod exec;
pub mod hash;
pub mod source;
mod tool;
pub mod version;

pub use artifact::Artifact;
pub use error::{Result, ToolError};
pub use source::{ArtifactMetadata, ToolSource};
pub use tool::{SetupContext, Tool, ensure_ready};
