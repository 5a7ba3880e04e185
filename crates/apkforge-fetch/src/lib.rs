//! Chunked HTTP streaming to disk.
//!
//! The transfer loop reads the response body chunk by chunk, optionally
//! passes each chunk through a stateful [`Decoder`], writes to the
//! destination file, and forwards progress through an
//! [`apkforge_progress::Reporter`]. Network access sits behind the
//! [`HttpClient`] trait so tests can drive the loop with canned streams.

mod decode;
mod error;
mod http;
mod transfer;

pub use decode::{Base64Decoder, Decoder};
pub use error::{FetchError, Result};
pub use http::{BoxStream, ByteStream, HttpClient};
pub use transfer::{TransferOptions, transfer};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
