//! Tool readiness lifecycle.

use std::future::Future;

use tracing::info;

use apkforge_fetch::HttpClient;
use apkforge_progress::ProgressFn;

use crate::error::{Result, ToolError};

/// Shared state handed to every tool during setup.
pub struct SetupContext<'a, C: HttpClient> {
    pub client: &'a C,
    pub on_progress: Option<ProgressFn>,
}

impl<'a, C: HttpClient> SetupContext<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            on_progress: None,
        }
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn progress(&self) -> Option<ProgressFn> {
        self.on_progress.clone()
    }
}

/// An external tool the pipeline depends on.
pub trait Tool {
    fn name(&self) -> &str;

    /// Whether the tool is usable right now: its files are present,
    /// valid, and it passes its self-test.
    fn is_ready(&self) -> impl Future<Output = bool> + Send;

    /// Fetch whatever is missing and leave the tool ready.
    fn setup<C: HttpClient>(
        &mut self,
        ctx: &SetupContext<'_, C>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Make `tool` ready, doing nothing if it already is. A tool that still
/// reports not-ready after its own setup succeeded is an error.
pub async fn ensure_ready<T: Tool, C: HttpClient>(
    tool: &mut T,
    ctx: &SetupContext<'_, C>,
) -> Result<()> {
    if tool.is_ready().await {
        return Ok(());
    }
    info!(tool = tool.name(), "setting up");
    tool.setup(ctx).await?;
    if !tool.is_ready().await {
        return Err(ToolError::NotReady {
            name: tool.name().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use futures_util::stream;

    use apkforge_fetch::{ByteStream, FetchError};

    use super::*;

    struct NullClient;

    impl HttpClient for NullClient {
        async fn get(
            &self,
            _url: &str,
            _headers: &[(String, String)],
        ) -> std::result::Result<ByteStream, FetchError> {
            Ok(ByteStream {
                content_length: Some(0),
                stream: Box::pin(stream::iter([Ok(Bytes::new())])),
            })
        }
    }

    /// Becomes ready after one setup; counts setups.
    struct FlakyTool {
        ready: bool,
        setups: AtomicUsize,
        becomes_ready: bool,
    }

    impl FlakyTool {
        fn new(becomes_ready: bool) -> Self {
            Self {
                ready: false,
                setups: AtomicUsize::new(0),
                becomes_ready,
            }
        }
    }

    impl Tool for FlakyTool {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn is_ready(&self) -> bool {
            self.ready
        }

        async fn setup<C: HttpClient>(&mut self, _ctx: &SetupContext<'_, C>) -> Result<()> {
            self.setups.fetch_add(1, Ordering::SeqCst);
            self.ready = self.becomes_ready;
            Ok(())
        }
    }

    #[tokio::test]
    async fn ready_tool_skips_setup() {
        let mut tool = FlakyTool::new(true);
        tool.ready = true;
        let ctx = SetupContext::new(&NullClient);
        ensure_ready(&mut tool, &ctx).await.expect("ensure_ready");
        assert_eq!(tool.setups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn setup_runs_once_then_becomes_a_no_op() {
        let mut tool = FlakyTool::new(true);
        let ctx = SetupContext::new(&NullClient);
        ensure_ready(&mut tool, &ctx).await.expect("first");
        ensure_ready(&mut tool, &ctx).await.expect("second");
        assert_eq!(tool.setups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn setup_that_does_not_stick_is_an_error() {
        let mut tool = FlakyTool::new(false);
        let ctx = SetupContext::new(&NullClient);
        let err = ensure_ready(&mut tool, &ctx).await.expect_err("should fail");
        assert!(matches!(err, ToolError::NotReady { name } if name == "flaky"));
    }
}
