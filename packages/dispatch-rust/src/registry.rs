//! Operation registration: the once-per-operation half of dispatch.
//!
//! Registration front-loads every per-operation check: the declared shape
//! is validated against the entry point, the configured fallback is
//! resolved and signature-checked against the catalog, and the key pair is
//! derived. Both failure modes ([`DispatchError::Resolution`] and
//! [`DispatchError::UnsupportedShape`]) therefore surface here, before any
//! engine ever sees a submission.

use std::future::Future;
use std::sync::Arc;

use breakwater_core::{BoxError, CommandKeys, DispatchError};
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::Stream;

use crate::config::DispatchConfig;
use crate::descriptor::{OperationDescriptor, ParamList, ReturnShape};
use crate::fallback::FallbackCatalog;
use crate::operation::{StreamFn, StreamOperation, ValueFn, ValueOperation};

// ---------------------------------------------------------------------------
// OperationRegistry
// ---------------------------------------------------------------------------

/// Registry of protected operations.
///
/// Holds the derived keys per declared name for introspection. Note that two
/// registrations with the same declared name intentionally share keys under
/// the default scope — the engine buckets them together.
pub struct OperationRegistry {
    config: DispatchConfig,
    registered: DashMap<String, CommandKeys>,
}

impl OperationRegistry {
    /// Create a registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DispatchConfig::default())
    }

    /// Create a registry with an explicit configuration.
    #[must_use]
    pub fn with_config(config: DispatchConfig) -> Self {
        Self {
            config,
            registered: DashMap::new(),
        }
    }

    /// Register a single-value operation.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnsupportedShape`] when the descriptor declares a
    /// non-value shape; [`DispatchError::Resolution`] when a configured
    /// fallback identifier has no matching candidate.
    pub fn register_value<A, T, F, Fut>(
        &self,
        descriptor: OperationDescriptor,
        primary: F,
        catalog: &FallbackCatalog,
    ) -> Result<Arc<ValueOperation<A, T>>, DispatchError>
    where
        A: ParamList,
        T: Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        check_shape(&descriptor, ReturnShape::Value)?;
        let fallback = match descriptor.fallback() {
            Some(identifier) => {
                Some(catalog.resolve_value::<A, T>(descriptor.name(), identifier)?)
            }
            None => None,
        };
        let keys = self.derive_keys(&descriptor);
        let primary: ValueFn<A, T> = Arc::new(
            move |args| -> BoxFuture<'static, Result<T, BoxError>> { Box::pin(primary(args)) },
        );
        Ok(Arc::new(ValueOperation::new(
            descriptor, keys, primary, fallback,
        )))
    }

    /// Register a streaming operation.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`OperationRegistry::register_value`], with the
    /// shape check inverted.
    pub fn register_stream<A, T, F, S>(
        &self,
        descriptor: OperationDescriptor,
        primary: F,
        catalog: &FallbackCatalog,
    ) -> Result<Arc<StreamOperation<A, T>>, DispatchError>
    where
        A: ParamList,
        T: Send + 'static,
        F: Fn(A) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<T, BoxError>> + Send + 'static,
    {
        check_shape(&descriptor, ReturnShape::Stream)?;
        let fallback = match descriptor.fallback() {
            Some(identifier) => {
                Some(catalog.resolve_stream::<A, T>(descriptor.name(), identifier)?)
            }
            None => None,
        };
        let keys = self.derive_keys(&descriptor);
        let primary: StreamFn<A, T> = Arc::new(
            move |args| -> BoxStream<'static, Result<T, BoxError>> { Box::pin(primary(args)) },
        );
        Ok(Arc::new(StreamOperation::new(
            descriptor, keys, primary, fallback,
        )))
    }

    /// Keys derived for a registered name, if any registration happened.
    #[must_use]
    pub fn keys_for(&self, name: &str) -> Option<CommandKeys> {
        self.registered.get(name).map(|entry| entry.value().clone())
    }

    /// Number of distinct registered key entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// Whether no operation has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    fn derive_keys(&self, descriptor: &OperationDescriptor) -> CommandKeys {
        let keys = CommandKeys::derive_scoped(
            descriptor.name(),
            descriptor.receiver(),
            self.config.key_scope,
        );
        self.registered
            .insert(descriptor.name().to_string(), keys.clone());
        keys
    }
}

fn check_shape(
    descriptor: &OperationDescriptor,
    expected: ReturnShape,
) -> Result<(), DispatchError> {
    if descriptor.shape() == expected {
        Ok(())
    } else {
        Err(DispatchError::UnsupportedShape {
            operation: descriptor.name().to_string(),
            declared: descriptor.shape().to_string(),
        })
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("config", &self.config)
            .field("registered", &self.registered.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
