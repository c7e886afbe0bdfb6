//! Reference engine: executes commands directly, with no circuit state.
//!
//! `DirectEngine` satisfies the [`ResilienceEngine`] contract in the
//! simplest way that honors its semantics: run the primary, classify the
//! outcome, run the bound fallback strictly after an observed failure, and
//! report every event to a sink. It keeps no failure history and never
//! short-circuits or rejects, so it doubles as a conformance baseline for
//! real engines and as the engine used by this crate's tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use breakwater_core::{
    BoxError, CommandKeys, EventSink, ExecutionError, ExecutionEvent, ResilienceEngine,
    StreamCommand, StreamHandle, StreamThunk, ValueCommand,
};
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

// ---------------------------------------------------------------------------
// DirectEngine
// ---------------------------------------------------------------------------

/// Pass-through engine: primary first, fallback strictly after an observed
/// primary failure.
pub struct DirectEngine {
    sink: Arc<dyn EventSink>,
}

impl DirectEngine {
    /// Create an engine reporting events to the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Convenience constructor wiring a fresh [`breakwater_core::CommandLog`].
    #[must_use]
    pub fn with_log() -> (Self, Arc<breakwater_core::CommandLog>) {
        let log = Arc::new(breakwater_core::CommandLog::new());
        (Self::new(log.clone()), log)
    }
}

#[async_trait]
impl ResilienceEngine for DirectEngine {
    async fn submit_value<T: Send + 'static>(
        &self,
        command: ValueCommand<T>,
    ) -> Result<T, ExecutionError> {
        let ValueCommand {
            keys,
            primary,
            fallback,
        } = command;

        match primary().await {
            Ok(value) => {
                self.sink.record(&keys.command, ExecutionEvent::Success);
                Ok(value)
            }
            Err(primary_err) => {
                self.sink.record(&keys.command, ExecutionEvent::Failure);
                tracing::debug!(
                    command = %keys.command,
                    error = %primary_err,
                    "primary execution failed"
                );
                match fallback {
                    Some(fallback) => match fallback().await {
                        Ok(value) => {
                            self.sink
                                .record(&keys.command, ExecutionEvent::FallbackSuccess);
                            Ok(value)
                        }
                        Err(fallback_err) => {
                            self.sink
                                .record(&keys.command, ExecutionEvent::FallbackFailure);
                            Err(ExecutionError::FallbackFailed {
                                primary: primary_err,
                                fallback: fallback_err,
                            })
                        }
                    },
                    None => Err(ExecutionError::PrimaryFailed {
                        source: primary_err,
                    }),
                }
            }
        }
    }

    fn submit_stream<T: Send + 'static>(&self, command: StreamCommand<T>) -> StreamHandle<T> {
        let StreamCommand {
            keys,
            primary,
            fallback,
        } = command;
        let cancel = CancellationToken::new();
        let stream = DirectStream {
            keys,
            sink: self.sink.clone(),
            cancelled: Box::pin(cancel.clone().cancelled_owned()),
            fallback,
            primary_failure: None,
            state: StreamState::Unstarted(primary),
        };
        StreamHandle::new(stream.boxed(), cancel)
    }
}

impl std::fmt::Debug for DirectEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectEngine").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// DirectStream (state machine for the streaming shape)
// ---------------------------------------------------------------------------

enum StreamState<T> {
    /// Primary thunk not yet invoked. Lazy sequences stay lazy: the thunk
    /// runs on first poll, not at submission.
    Unstarted(StreamThunk<T>),
    Primary(BoxStream<'static, Result<T, BoxError>>),
    Fallback(BoxStream<'static, Result<T, BoxError>>),
    Done,
}

struct DirectStream<T> {
    keys: CommandKeys,
    sink: Arc<dyn EventSink>,
    /// Polled as a future, not sampled as a flag: a consumer parked on a
    /// pending inner stream must be woken when another task cancels.
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    fallback: Option<StreamThunk<T>>,
    primary_failure: Option<BoxError>,
    state: StreamState<T>,
}

impl<T: Send + 'static> Stream for DirectStream<T> {
    type Item = Result<T, ExecutionError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if matches!(this.state, StreamState::Done) {
                return Poll::Ready(None);
            }
            if this.cancelled.as_mut().poll(cx).is_ready() {
                this.state = StreamState::Done;
                return Poll::Ready(None);
            }
            match std::mem::replace(&mut this.state, StreamState::Done) {
                StreamState::Unstarted(primary) => {
                    this.state = StreamState::Primary(primary());
                }
                StreamState::Primary(mut stream) => match stream.as_mut().poll_next(cx) {
                    Poll::Pending => {
                        this.state = StreamState::Primary(stream);
                        return Poll::Pending;
                    }
                    Poll::Ready(Some(Ok(item))) => {
                        this.state = StreamState::Primary(stream);
                        return Poll::Ready(Some(Ok(item)));
                    }
                    Poll::Ready(None) => {
                        this.sink.record(&this.keys.command, ExecutionEvent::Success);
                        return Poll::Ready(None);
                    }
                    Poll::Ready(Some(Err(err))) => {
                        this.sink.record(&this.keys.command, ExecutionEvent::Failure);
                        tracing::debug!(
                            command = %this.keys.command,
                            error = %err,
                            "primary stream failed"
                        );
                        match this.fallback.take() {
                            Some(fallback) => {
                                // Items already emitted stay delivered; the
                                // remainder is replaced by the fallback stream.
                                this.primary_failure = Some(err);
                                this.state = StreamState::Fallback(fallback());
                            }
                            None => {
                                return Poll::Ready(Some(Err(ExecutionError::PrimaryFailed {
                                    source: err,
                                })));
                            }
                        }
                    }
                },
                StreamState::Fallback(mut stream) => match stream.as_mut().poll_next(cx) {
                    Poll::Pending => {
                        this.state = StreamState::Fallback(stream);
                        return Poll::Pending;
                    }
                    Poll::Ready(Some(Ok(item))) => {
                        this.state = StreamState::Fallback(stream);
                        return Poll::Ready(Some(Ok(item)));
                    }
                    Poll::Ready(None) => {
                        this.sink
                            .record(&this.keys.command, ExecutionEvent::FallbackSuccess);
                        return Poll::Ready(None);
                    }
                    Poll::Ready(Some(Err(err))) => {
                        this.sink
                            .record(&this.keys.command, ExecutionEvent::FallbackFailure);
                        let primary = this
                            .primary_failure
                            .take()
                            .unwrap_or_else(|| "primary stream failed".into());
                        return Poll::Ready(Some(Err(ExecutionError::FallbackFailed {
                            primary,
                            fallback: err,
                        })));
                    }
                },
                StreamState::Done => return Poll::Ready(None),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    fn keys() -> CommandKeys {
        CommandKeys::derive("probe")
    }

    fn failing_primary() -> breakwater_core::ValueThunk<u32> {
        Box::new(|| Box::pin(async { Err("boom".into()) }))
    }

    #[tokio::test]
    async fn value_success_records_a_success_event() {
        let (engine, log) = DirectEngine::with_log();
        let command = ValueCommand::new(keys(), Box::new(|| Box::pin(async { Ok(5u32) })));

        let value = engine.submit_value(command).await.unwrap();
        assert_eq!(value, 5);
        assert_eq!(log.events_for(&keys().command), vec![ExecutionEvent::Success]);
    }

    #[tokio::test]
    async fn value_failure_without_fallback_surfaces_primary_failed() {
        let (engine, log) = DirectEngine::with_log();
        let command = ValueCommand::new(keys(), failing_primary());

        let err = engine.submit_value(command).await.unwrap_err();
        assert!(matches!(err, ExecutionError::PrimaryFailed { .. }));
        assert_eq!(log.events_for(&keys().command), vec![ExecutionEvent::Failure]);
    }

    #[tokio::test]
    async fn value_failure_with_fallback_substitutes_its_result() {
        let (engine, log) = DirectEngine::with_log();
        let command = ValueCommand::new(keys(), failing_primary())
            .with_fallback(Box::new(|| Box::pin(async { Ok(99u32) })));

        let value = engine.submit_value(command).await.unwrap();
        assert_eq!(value, 99);
        assert_eq!(
            log.events_for(&keys().command),
            vec![ExecutionEvent::Failure, ExecutionEvent::FallbackSuccess],
        );
    }

    #[tokio::test]
    async fn failing_fallback_reports_both_causes() {
        let (engine, log) = DirectEngine::with_log();
        let command = ValueCommand::new(keys(), failing_primary())
            .with_fallback(Box::new(|| Box::pin(async { Err("fallback down".into()) })));

        let err = engine.submit_value(command).await.unwrap_err();
        match err {
            ExecutionError::FallbackFailed { primary, fallback } => {
                assert_eq!(primary.to_string(), "boom");
                assert_eq!(fallback.to_string(), "fallback down");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            log.events_for(&keys().command),
            vec![ExecutionEvent::Failure, ExecutionEvent::FallbackFailure],
        );
    }

    #[tokio::test]
    async fn stream_completion_records_success() {
        let (engine, log) = DirectEngine::with_log();
        let command = StreamCommand::new(
            keys(),
            Box::new(|| futures_util::stream::iter(vec![Ok(1u32), Ok(2), Ok(3)]).boxed()),
        );

        let handle = engine.submit_stream(command);
        let items: Vec<u32> = handle.map(Result::unwrap).collect().await;
        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(log.events_for(&keys().command), vec![ExecutionEvent::Success]);
    }

    #[tokio::test]
    async fn stream_failure_switches_to_the_fallback_stream() {
        let (engine, log) = DirectEngine::with_log();
        let command = StreamCommand::new(
            keys(),
            Box::new(|| {
                futures_util::stream::iter(vec![Ok(1u32), Err::<u32, BoxError>("boom".into())])
                    .boxed()
            }),
        )
        .with_fallback(Box::new(|| {
            futures_util::stream::iter(vec![Ok(8u32), Ok(9)]).boxed()
        }));

        let handle = engine.submit_stream(command);
        let items: Vec<u32> = handle.map(Result::unwrap).collect().await;
        // The element emitted before the failure stays delivered.
        assert_eq!(items, vec![1, 8, 9]);
        assert_eq!(
            log.events_for(&keys().command),
            vec![ExecutionEvent::Failure, ExecutionEvent::FallbackSuccess],
        );
    }

    #[tokio::test]
    async fn stream_failure_without_fallback_ends_with_primary_failed() {
        let (engine, _log) = DirectEngine::with_log();
        let command = StreamCommand::new(
            keys(),
            Box::new(|| {
                futures_util::stream::iter(vec![Ok(1u32), Err::<u32, BoxError>("boom".into())])
                    .boxed()
            }),
        );

        let mut handle = engine.submit_stream(command);
        assert_eq!(handle.next().await.unwrap().unwrap(), 1);
        let err = handle.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ExecutionError::PrimaryFailed { .. }));
        assert!(handle.next().await.is_none());
    }

    #[tokio::test]
    async fn cancellation_stops_delivery() {
        let (engine, _log) = DirectEngine::with_log();
        let command = StreamCommand::new(
            keys(),
            Box::new(|| {
                futures_util::stream::repeat(1u32)
                    .map(Ok::<u32, BoxError>)
                    .boxed()
            }),
        );

        let mut handle = engine.submit_stream(command);
        assert_eq!(handle.next().await.unwrap().unwrap(), 1);
        handle.cancel();
        assert!(handle.next().await.is_none());
    }

    #[tokio::test]
    async fn cancellation_wakes_a_consumer_parked_on_a_pending_stream() {
        let (engine, _log) = DirectEngine::with_log();
        let command = StreamCommand::new(
            keys(),
            Box::new(|| futures_util::stream::pending::<Result<u32, BoxError>>().boxed()),
        );

        let mut handle = engine.submit_stream(command);
        let token = handle.cancellation_token();
        let consumer = tokio::spawn(async move { handle.next().await });
        tokio::task::yield_now().await;
        token.cancel();

        let next = tokio::time::timeout(std::time::Duration::from_secs(1), consumer)
            .await
            .expect("consumer should wake once the token is cancelled")
            .unwrap();
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn submission_is_lazy_until_first_poll() {
        let (engine, log) = DirectEngine::with_log();
        let started = Arc::new(parking_lot::Mutex::new(false));
        let flag = started.clone();
        let command = StreamCommand::new(
            keys(),
            Box::new(move || {
                *flag.lock() = true;
                futures_util::stream::iter(vec![Ok(1u32)]).boxed()
            }),
        );

        let handle = engine.submit_stream(command);
        assert!(!*started.lock());
        assert!(log.is_empty());

        let items: Vec<u32> = handle.map(Result::unwrap).collect().await;
        assert_eq!(items, vec![1]);
        assert!(*started.lock());
    }
}
