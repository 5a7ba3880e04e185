use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;

use crate::error::{FetchError, Result};

/// A stateful transform applied to each chunk between the network and the
/// destination file.
///
/// A decoder may buffer an undecodable remainder across calls when the
/// encoding requires input lengths to be multiples of a fixed block size.
/// `finish` flushes whatever is still buffered at end-of-stream.
pub trait Decoder: Send {
    fn decode(&mut self, chunk: &[u8]) -> Result<Bytes>;
    fn finish(&mut self) -> Result<Bytes>;
}

/// Streaming base64 decoder.
///
/// Base64 only decodes in 4-byte quanta, so the trailing `len % 4` bytes
/// of every chunk are carried over to the next call. CR/LF bytes are
/// stripped before alignment so wrapped payloads keep quanta intact.
#[derive(Default)]
pub struct Base64Decoder {
    pending: Vec<u8>,
}

impl Base64Decoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for Base64Decoder {
    fn decode(&mut self, chunk: &[u8]) -> Result<Bytes> {
        self.pending
            .extend(chunk.iter().copied().filter(|b| *b != b'\r' && *b != b'\n'));

        let decodable = self.pending.len() - self.pending.len() % 4;
        if decodable == 0 {
            return Ok(Bytes::new());
        }

        let decoded = STANDARD
            .decode(&self.pending[..decodable])
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        self.pending.drain(..decodable);
        Ok(Bytes::from(decoded))
    }

    fn finish(&mut self) -> Result<Bytes> {
        if self.pending.is_empty() {
            return Ok(Bytes::new());
        }
        let decoded = STANDARD
            .decode(&self.pending)
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        self.pending.clear();
        Ok(Bytes::from(decoded))
    }
}
