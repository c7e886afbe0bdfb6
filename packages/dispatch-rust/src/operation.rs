//! Registered operations: the pre-bound form of an intercepted call.
//!
//! Key derivation, fallback lookup, and return-shape validation all happen
//! once at registration and are captured in one of two typed handles. Per
//! call, a handle only clones its callables and packages the live arguments
//! into a command.

use std::fmt;
use std::sync::Arc;

use breakwater_core::{
    BoxError, CommandKeys, StreamCommand, StreamThunk, ValueCommand, ValueThunk,
};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

use crate::descriptor::{OperationDescriptor, ParamList};

/// Pre-bound single-value callable: arguments in, boxed future out.
pub type ValueFn<A, T> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, BoxError>> + Send + Sync>;

/// Pre-bound stream-producing callable.
pub type StreamFn<A, T> = Arc<dyn Fn(A) -> BoxStream<'static, Result<T, BoxError>> + Send + Sync>;

// ---------------------------------------------------------------------------
// ValueOperation
// ---------------------------------------------------------------------------

/// A registered single-value operation.
pub struct ValueOperation<A, T> {
    descriptor: OperationDescriptor,
    keys: CommandKeys,
    primary: ValueFn<A, T>,
    fallback: Option<ValueFn<A, T>>,
}

impl<A, T> ValueOperation<A, T>
where
    A: ParamList,
    T: Send + 'static,
{
    pub(crate) fn new(
        descriptor: OperationDescriptor,
        keys: CommandKeys,
        primary: ValueFn<A, T>,
        fallback: Option<ValueFn<A, T>>,
    ) -> Self {
        Self {
            descriptor,
            keys,
            primary,
            fallback,
        }
    }

    /// The descriptor this operation was registered from.
    #[must_use]
    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    /// The stable key pair derived at registration.
    #[must_use]
    pub fn keys(&self) -> &CommandKeys {
        &self.keys
    }

    /// Whether a fallback callable is bound.
    #[must_use]
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Package the live arguments into a one-shot command.
    ///
    /// The fallback thunk, when bound, captures a clone of the exact same
    /// arguments the primary receives.
    pub(crate) fn command(&self, args: A) -> ValueCommand<T> {
        let fallback = self.fallback.as_ref().map(|callable| {
            let callable = callable.clone();
            let args = args.clone();
            Box::new(move || callable(args)) as ValueThunk<T>
        });
        let primary = self.primary.clone();
        let mut command =
            ValueCommand::new(self.keys.clone(), Box::new(move || primary(args)));
        if let Some(fallback) = fallback {
            command = command.with_fallback(fallback);
        }
        command
    }
}

impl<A, T> fmt::Debug for ValueOperation<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueOperation")
            .field("descriptor", &self.descriptor)
            .field("keys", &self.keys)
            .field("has_fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// StreamOperation
// ---------------------------------------------------------------------------

/// A registered streaming operation.
pub struct StreamOperation<A, T> {
    descriptor: OperationDescriptor,
    keys: CommandKeys,
    primary: StreamFn<A, T>,
    fallback: Option<StreamFn<A, T>>,
}

impl<A, T> StreamOperation<A, T>
where
    A: ParamList,
    T: Send + 'static,
{
    pub(crate) fn new(
        descriptor: OperationDescriptor,
        keys: CommandKeys,
        primary: StreamFn<A, T>,
        fallback: Option<StreamFn<A, T>>,
    ) -> Self {
        Self {
            descriptor,
            keys,
            primary,
            fallback,
        }
    }

    /// The descriptor this operation was registered from.
    #[must_use]
    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    /// The stable key pair derived at registration.
    #[must_use]
    pub fn keys(&self) -> &CommandKeys {
        &self.keys
    }

    /// Whether a fallback callable is bound.
    #[must_use]
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Package the live arguments into a one-shot command. The produced
    /// streams stay lazy: nothing runs until the engine's handle is polled.
    pub(crate) fn command(&self, args: A) -> StreamCommand<T> {
        let fallback = self.fallback.as_ref().map(|callable| {
            let callable = callable.clone();
            let args = args.clone();
            Box::new(move || callable(args)) as StreamThunk<T>
        });
        let primary = self.primary.clone();
        let mut command =
            StreamCommand::new(self.keys.clone(), Box::new(move || primary(args)));
        if let Some(fallback) = fallback {
            command = command.with_fallback(fallback);
        }
        command
    }
}

impl<A, T> fmt::Debug for StreamOperation<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOperation")
            .field("descriptor", &self.descriptor)
            .field("keys", &self.keys)
            .field("has_fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
