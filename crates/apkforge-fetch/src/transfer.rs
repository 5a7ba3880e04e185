use std::path::Path;

use apkforge_progress::{ProgressUnit, Reporter};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::decode::Decoder;
use crate::error::Result;
use crate::http::HttpClient;

/// Configuration for a single [`transfer`].
#[derive(Default)]
pub struct TransferOptions {
    /// Expected byte count; falls back to Content-Length, then unknown.
    pub expected_size: Option<u64>,
    /// Custom headers sent with the request.
    pub headers: Vec<(String, String)>,
    /// Optional mid-stream decode filter.
    pub decoder: Option<Box<dyn Decoder>>,
}

impl TransferOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn expected_size(mut self, expected_size: Option<u64>) -> Self {
        self.expected_size = expected_size;
        self
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn decoder(mut self, decoder: Box<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }
}

/// Stream `url` into `destination`, creating parent directories as needed.
///
/// Emits one progress sequence on `reporter`: a begin with the expected
/// size (if known), a `Progress` event per written chunk with `delta` set
/// to the bytes written, and a final `Stop`. An observer returning `false`
/// aborts with [`apkforge_progress::Cancelled`]; the partial destination
/// file is left in place for the caller to clean up.
///
/// Returns the number of bytes written.
pub async fn transfer<C: HttpClient>(
    client: &C,
    url: &str,
    destination: &Path,
    mut options: TransferOptions,
    reporter: &mut Reporter,
) -> Result<u64> {
    let response = client.get(url, &options.headers).await?;
    let total = options.expected_size.or(response.content_length);

    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    reporter.begin(format!("downloading {file_name}"), ProgressUnit::Bytes, total)?;

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(destination).await?;

    tracing::debug!(url, dest = %destination.display(), ?total, "transfer started");

    let mut stream = response.stream;
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let chunk = match options.decoder.as_mut() {
            Some(decoder) => decoder.decode(&chunk)?,
            None => chunk,
        };
        if chunk.is_empty() {
            continue;
        }
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        reporter.advance(chunk.len() as u64)?;
    }

    if let Some(decoder) = options.decoder.as_mut() {
        let tail = decoder.finish()?;
        if !tail.is_empty() {
            file.write_all(&tail).await?;
            written += tail.len() as u64;
            reporter.advance(tail.len() as u64)?;
        }
    }

    file.flush().await?;
    reporter.finish();
    tracing::debug!(url, written, "transfer finished");
    Ok(written)
}
