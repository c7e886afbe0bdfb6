//! Fallback candidates and registration-time resolution.
//!
//! Resolution happens exactly once, when an operation is registered, never
//! per call: a [`FallbackCatalog`] holds named candidates with their
//! recorded parameter signatures, and resolution checks name, shape,
//! parameter-type list, and return type before handing back a pre-bound
//! callable. A configured identifier that resolves to nothing fails
//! registration immediately.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use breakwater_core::{BoxError, DispatchError};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::Stream;

use crate::descriptor::{ParamList, ReturnShape};
use crate::operation::{StreamFn, ValueFn};

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// One named fallback candidate with its recorded signature.
struct Candidate {
    shape: ReturnShape,
    param_types: Vec<TypeId>,
    param_names: Vec<&'static str>,
    return_name: &'static str,
    callable: Box<dyn Any + Send + Sync>,
}

// ---------------------------------------------------------------------------
// FallbackCatalog
// ---------------------------------------------------------------------------

/// Named fallback candidates available to a receiver's operations.
#[derive(Default)]
pub struct FallbackCatalog {
    entries: HashMap<String, Candidate>,
}

impl FallbackCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single-value fallback candidate.
    #[must_use]
    pub fn value<A, T, F, Fut>(mut self, name: impl Into<String>, callable: F) -> Self
    where
        A: ParamList,
        T: Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        let bound: ValueFn<A, T> = Arc::new(
            move |args| -> BoxFuture<'static, Result<T, BoxError>> { Box::pin(callable(args)) },
        );
        self.entries.insert(
            name.into(),
            Candidate {
                shape: ReturnShape::Value,
                param_types: A::type_ids(),
                param_names: A::type_names(),
                return_name: std::any::type_name::<T>(),
                callable: Box::new(bound),
            },
        );
        self
    }

    /// Add a stream-producing fallback candidate.
    #[must_use]
    pub fn stream<A, T, F, S>(mut self, name: impl Into<String>, callable: F) -> Self
    where
        A: ParamList,
        T: Send + 'static,
        F: Fn(A) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<T, BoxError>> + Send + 'static,
    {
        let bound: StreamFn<A, T> = Arc::new(
            move |args| -> BoxStream<'static, Result<T, BoxError>> { Box::pin(callable(args)) },
        );
        self.entries.insert(
            name.into(),
            Candidate {
                shape: ReturnShape::Stream,
                param_types: A::type_ids(),
                param_names: A::type_names(),
                return_name: std::any::type_name::<T>(),
                callable: Box::new(bound),
            },
        );
        self
    }

    /// Number of candidates in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog holds no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a single-value fallback for `operation`.
    pub(crate) fn resolve_value<A, T>(
        &self,
        operation: &str,
        identifier: &str,
    ) -> Result<ValueFn<A, T>, DispatchError>
    where
        A: ParamList,
        T: Send + 'static,
    {
        let candidate = self.lookup::<A, T>(operation, identifier, ReturnShape::Value)?;
        candidate
            .callable
            .downcast_ref::<ValueFn<A, T>>()
            .cloned()
            .ok_or_else(|| resolution_error(operation, identifier, "signature mismatch"))
    }

    /// Resolve a stream-producing fallback for `operation`.
    pub(crate) fn resolve_stream<A, T>(
        &self,
        operation: &str,
        identifier: &str,
    ) -> Result<StreamFn<A, T>, DispatchError>
    where
        A: ParamList,
        T: Send + 'static,
    {
        let candidate = self.lookup::<A, T>(operation, identifier, ReturnShape::Stream)?;
        candidate
            .callable
            .downcast_ref::<StreamFn<A, T>>()
            .cloned()
            .ok_or_else(|| resolution_error(operation, identifier, "signature mismatch"))
    }

    /// Shared name/shape/signature checks, run before the downcast.
    fn lookup<A, T>(
        &self,
        operation: &str,
        identifier: &str,
        expected_shape: ReturnShape,
    ) -> Result<&Candidate, DispatchError>
    where
        A: ParamList,
        T: Send + 'static,
    {
        let Some(candidate) = self.entries.get(identifier) else {
            return Err(resolution_error(
                operation,
                identifier,
                "no candidate with that name",
            ));
        };
        if candidate.shape != expected_shape {
            return Err(resolution_error(
                operation,
                identifier,
                format!(
                    "candidate produces a {} result, operation expects {expected_shape}",
                    candidate.shape
                ),
            ));
        }
        if candidate.param_types != A::type_ids() {
            return Err(resolution_error(
                operation,
                identifier,
                format!(
                    "parameter types differ: operation takes ({}), candidate takes ({})",
                    A::type_names().join(", "),
                    candidate.param_names.join(", "),
                ),
            ));
        }
        let expected_return = std::any::type_name::<T>();
        if candidate.return_name != expected_return {
            return Err(resolution_error(
                operation,
                identifier,
                format!(
                    "return type differs: operation produces {expected_return}, \
                     candidate produces {}",
                    candidate.return_name
                ),
            ));
        }
        Ok(candidate)
    }
}

impl std::fmt::Debug for FallbackCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackCatalog")
            .field("candidates", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn resolution_error(
    operation: &str,
    identifier: &str,
    detail: impl Into<String>,
) -> DispatchError {
    DispatchError::Resolution {
        operation: operation.to_string(),
        fallback: identifier.to_string(),
        detail: detail.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
