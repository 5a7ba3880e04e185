use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::error::{FetchError, Result};

/// A boxed stream of response body chunks.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// An open streaming response.
pub struct ByteStream {
    /// Content-Length, when the server supplied one.
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, Result<Bytes>>,
}

/// Minimal HTTP abstraction consumed by [`transfer`](crate::transfer).
///
/// Implementations follow redirects themselves and must map failure
/// statuses (>= 400) to [`FetchError::Http`] before yielding any body
/// bytes.
pub trait HttpClient: Send + Sync {
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<ByteStream>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::StreamExt;

    use super::*;

    /// Production client backed by `reqwest`.
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new() -> Self {
            Self {
                client: reqwest::Client::new(),
            }
        }

        pub fn from_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl Default for ReqwestClient {
        fn default() -> Self {
            Self::new()
        }
    }

    impl HttpClient for ReqwestClient {
        async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<ByteStream> {
            let mut request = self.client.get(url);
            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await.map_err(|e| FetchError::Network {
                url: url.to_string(),
                detail: e.to_string(),
            })?;

            let status = response.status();
            if status.as_u16() >= 400 {
                return Err(FetchError::Http {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let content_length = response.content_length();
            let url = url.to_string();
            let stream = response.bytes_stream().map(move |chunk| {
                chunk.map_err(|e| FetchError::Network {
                    url: url.clone(),
                    detail: e.to_string(),
                })
            });

            Ok(ByteStream {
                content_length,
                stream: Box::pin(stream),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
