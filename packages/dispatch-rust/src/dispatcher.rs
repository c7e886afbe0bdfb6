//! The command dispatcher: one entry point per invocation shape.
//!
//! Per call the dispatcher does exactly three things: package a registered
//! operation's callables and the live arguments into a command, submit it to
//! the engine, and hand the result back unchanged. It is stateless between
//! calls, never retries, and never rewrites an engine decision — whether the
//! primary ran, the fallback substituted, or the circuit refused the call is
//! entirely the engine's verdict.

use std::sync::Arc;

use breakwater_core::{ExecutionError, ResilienceEngine, StreamHandle};
use tracing::Instrument;

use crate::descriptor::ParamList;
use crate::operation::{StreamOperation, ValueOperation};

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Submits registered operations to a resilience engine.
pub struct Dispatcher<E> {
    engine: Arc<E>,
}

impl<E> Dispatcher<E> {
    /// Create a dispatcher over the given engine.
    #[must_use]
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// The engine behind this dispatcher.
    #[must_use]
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }
}

impl<E> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<E> std::fmt::Debug for Dispatcher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl<E: ResilienceEngine> Dispatcher<E> {
    /// Dispatch a single-value call. Resolves when the engine produced the
    /// primary's value, the fallback's value, or a terminal failure —
    /// forwarded verbatim.
    pub async fn dispatch_value<A, T>(
        &self,
        operation: &ValueOperation<A, T>,
        args: A,
    ) -> Result<T, ExecutionError>
    where
        A: ParamList,
        T: Send + 'static,
    {
        let span = tracing::debug_span!(
            "dispatch",
            group = %operation.keys().group,
            command = %operation.keys().command,
            shape = "value",
            outcome = tracing::field::Empty,
        );
        async {
            let result = self.engine.submit_value(operation.command(args)).await;
            let outcome = match &result {
                Ok(_) => "ok",
                Err(_) => "error",
            };
            tracing::Span::current().record("outcome", outcome);
            result
        }
        .instrument(span)
        .await
    }

    /// Dispatch a streaming call. Returns the engine's stream handle
    /// immediately; the caller's task never blocks here. Consumption,
    /// backpressure, and cancellation flow through the handle.
    pub fn dispatch_stream<A, T>(
        &self,
        operation: &StreamOperation<A, T>,
        args: A,
    ) -> StreamHandle<T>
    where
        A: ParamList,
        T: Send + 'static,
    {
        tracing::debug!(
            group = %operation.keys().group,
            command = %operation.keys().command,
            shape = "stream",
            "dispatching stream command"
        );
        self.engine.submit_stream(operation.command(args))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
