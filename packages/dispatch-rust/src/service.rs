//! Tower adapters over registered operations.
//!
//! A registered operation plus a dispatcher is a service over its argument
//! tuple: `ValueDispatchService` responds with the call's value,
//! `StreamDispatchService` responds immediately with the stream handle.
//! Both are always ready — admission control lives in the engine, not here.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use breakwater_core::{ExecutionError, ResilienceEngine, StreamHandle};
use tower::Service;

use crate::descriptor::ParamList;
use crate::dispatcher::Dispatcher;
use crate::operation::{StreamOperation, ValueOperation};

// ---------------------------------------------------------------------------
// ValueDispatchService
// ---------------------------------------------------------------------------

/// Tower service dispatching a single-value operation.
pub struct ValueDispatchService<E, A, T> {
    dispatcher: Dispatcher<E>,
    operation: Arc<ValueOperation<A, T>>,
}

impl<E, A, T> ValueDispatchService<E, A, T> {
    /// Bind a registered operation to a dispatcher.
    #[must_use]
    pub fn new(dispatcher: Dispatcher<E>, operation: Arc<ValueOperation<A, T>>) -> Self {
        Self {
            dispatcher,
            operation,
        }
    }
}

impl<E, A, T> Clone for ValueDispatchService<E, A, T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            operation: self.operation.clone(),
        }
    }
}

impl<E, A, T> Service<A> for ValueDispatchService<E, A, T>
where
    E: ResilienceEngine + 'static,
    A: ParamList,
    T: Send + 'static,
{
    type Response = T;
    type Error = ExecutionError;
    type Future = Pin<Box<dyn Future<Output = Result<T, ExecutionError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, args: A) -> Self::Future {
        let dispatcher = self.dispatcher.clone();
        let operation = self.operation.clone();
        Box::pin(async move { dispatcher.dispatch_value(&operation, args).await })
    }
}

// ---------------------------------------------------------------------------
// StreamDispatchService
// ---------------------------------------------------------------------------

/// Tower service dispatching a streaming operation.
///
/// The response is the stream handle itself; the service's future is always
/// immediately ready because stream dispatch never blocks.
pub struct StreamDispatchService<E, A, T> {
    dispatcher: Dispatcher<E>,
    operation: Arc<StreamOperation<A, T>>,
}

impl<E, A, T> StreamDispatchService<E, A, T> {
    /// Bind a registered operation to a dispatcher.
    #[must_use]
    pub fn new(dispatcher: Dispatcher<E>, operation: Arc<StreamOperation<A, T>>) -> Self {
        Self {
            dispatcher,
            operation,
        }
    }
}

impl<E, A, T> Clone for StreamDispatchService<E, A, T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            operation: self.operation.clone(),
        }
    }
}

impl<E, A, T> Service<A> for StreamDispatchService<E, A, T>
where
    E: ResilienceEngine + 'static,
    A: ParamList,
    T: Send + 'static,
{
    type Response = StreamHandle<T>;
    type Error = Infallible;
    type Future = std::future::Ready<Result<StreamHandle<T>, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, args: A) -> Self::Future {
        std::future::ready(Ok(self.dispatcher.dispatch_stream(&self.operation, args)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
