//! The resilience-engine contract.
//!
//! The dispatch layer never implements failure-rate tracking, rolling
//! windows, or the open/half-open/closed state machine — it submits
//! commands to something that does. This module pins down the minimal
//! surface such an engine must expose: a blocking contract for the value
//! shape and a subscription contract for the stream shape.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::Stream;
use tokio_util::sync::CancellationToken;

use crate::command::{StreamCommand, ValueCommand};
use crate::error::ExecutionError;

// ---------------------------------------------------------------------------
// ResilienceEngine
// ---------------------------------------------------------------------------

/// Contract between the dispatch layer and a resilience engine.
///
/// `submit_value` resolves once the engine produced a single result or a
/// terminal failure; the engine may run the thunks on its own workers, but
/// the caller's observable contract is await-to-completion. `submit_stream`
/// never blocks: it hands back a [`StreamHandle`] immediately, and
/// consumption, backpressure, and cancellation flow through that handle.
///
/// Ordering guarantee engines must uphold: within one submission, the
/// fallback thunk (if any) runs only after the primary's failure has been
/// observed — never interleaved with it.
#[async_trait]
pub trait ResilienceEngine: Send + Sync {
    /// Execute a single-value command, returning the primary's result, the
    /// fallback's result after a primary failure, or a terminal
    /// [`ExecutionError`].
    async fn submit_value<T: Send + 'static>(
        &self,
        command: ValueCommand<T>,
    ) -> Result<T, ExecutionError>;

    /// Begin a streaming command. The primary thunk must not run before the
    /// handle is first polled (lazy sequences stay lazy).
    fn submit_stream<T: Send + 'static>(&self, command: StreamCommand<T>) -> StreamHandle<T>;
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// Handle to a streaming submission.
///
/// Yields the command's items; terminal failures arrive as an
/// [`ExecutionError`] item followed by end-of-stream. Dropping the handle or
/// calling [`StreamHandle::cancel`] propagates cancellation to the engine via
/// the embedded token — the dispatch layer never absorbs a cancellation
/// request.
pub struct StreamHandle<T> {
    stream: BoxStream<'static, Result<T, ExecutionError>>,
    cancel: CancellationToken,
}

impl<T> StreamHandle<T> {
    /// Wrap an engine-produced stream and its cancellation token.
    #[must_use]
    pub fn new(
        stream: BoxStream<'static, Result<T, ExecutionError>>,
        cancel: CancellationToken,
    ) -> Self {
        Self { stream, cancel }
    }

    /// Request cancellation of the underlying execution.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The token the engine watches for cancellation.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl<T> Stream for StreamHandle<T> {
    type Item = Result<T, ExecutionError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().stream.as_mut().poll_next(cx)
    }
}

impl<T> Drop for StreamHandle<T> {
    fn drop(&mut self) {
        // An abandoned subscription counts as cancellation.
        self.cancel.cancel();
    }
}

impl<T> std::fmt::Debug for StreamHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn handle_yields_the_wrapped_items() {
        let inner = futures_util::stream::iter(vec![Ok(1u32), Ok(2), Ok(3)]).boxed();
        let mut handle = StreamHandle::new(inner, CancellationToken::new());

        let mut seen = Vec::new();
        while let Some(item) = handle.next().await {
            seen.push(item.unwrap());
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn cancel_trips_the_shared_token() {
        let inner = futures_util::stream::pending::<Result<u32, ExecutionError>>().boxed();
        let handle = StreamHandle::new(inner, CancellationToken::new());
        let token = handle.cancellation_token();

        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn dropping_the_handle_cancels() {
        let inner = futures_util::stream::pending::<Result<u32, ExecutionError>>().boxed();
        let handle = StreamHandle::new(inner, CancellationToken::new());
        let token = handle.cancellation_token();

        drop(handle);
        assert!(token.is_cancelled());
    }
}
