//! Command types: the unit of work submitted to a resilience engine.
//!
//! A command pairs a primary thunk with an optional fallback thunk under a
//! stable key pair. Commands are constructed per call, submitted once, and
//! discarded after the engine returns. Thunks are `FnOnce`: a fresh
//! submission is required per independent execution (stream consumptions
//! included — the primary stream is not restartable).

use std::fmt;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

use crate::error::BoxError;
use crate::keys::CommandKeys;

/// Deferred execution of a single-value body.
pub type ValueThunk<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, BoxError>> + Send>;

/// Deferred production of a lazy, possibly-infinite item sequence.
pub type StreamThunk<T> = Box<dyn FnOnce() -> BoxStream<'static, Result<T, BoxError>> + Send>;

// ---------------------------------------------------------------------------
// ValueCommand
// ---------------------------------------------------------------------------

/// Command for the blocking single-value shape.
pub struct ValueCommand<T> {
    pub keys: CommandKeys,
    pub primary: ValueThunk<T>,
    pub fallback: Option<ValueThunk<T>>,
}

impl<T> ValueCommand<T> {
    /// Build a command without a fallback binding.
    #[must_use]
    pub fn new(keys: CommandKeys, primary: ValueThunk<T>) -> Self {
        Self {
            keys,
            primary,
            fallback: None,
        }
    }

    /// Attach a fallback thunk.
    #[must_use]
    pub fn with_fallback(mut self, fallback: ValueThunk<T>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Whether a fallback thunk is bound.
    #[must_use]
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

impl<T> fmt::Debug for ValueCommand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCommand")
            .field("keys", &self.keys)
            .field("has_fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// StreamCommand
// ---------------------------------------------------------------------------

/// Command for the lazy streaming shape.
pub struct StreamCommand<T> {
    pub keys: CommandKeys,
    pub primary: StreamThunk<T>,
    pub fallback: Option<StreamThunk<T>>,
}

impl<T> StreamCommand<T> {
    /// Build a command without a fallback binding.
    #[must_use]
    pub fn new(keys: CommandKeys, primary: StreamThunk<T>) -> Self {
        Self {
            keys,
            primary,
            fallback: None,
        }
    }

    /// Attach a fallback thunk producing a replacement stream.
    #[must_use]
    pub fn with_fallback(mut self, fallback: StreamThunk<T>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Whether a fallback thunk is bound.
    #[must_use]
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

impl<T> fmt::Debug for StreamCommand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCommand")
            .field("keys", &self.keys)
            .field("has_fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
