//! Error taxonomy for the dispatch layer and the engine contract.
//!
//! Two families with very different propagation rules:
//!
//! - [`DispatchError`]: local, synchronous registration/dispatch failures.
//!   These are checked before anything reaches the engine and are never
//!   retried.
//! - [`ExecutionError`]: engine-mediated outcomes. The dispatch layer
//!   forwards these verbatim — no logging-and-swallowing, no rewriting,
//!   no retry of its own.

use thiserror::Error;

/// Boxed error produced by user-supplied primary and fallback bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ---------------------------------------------------------------------------
// ExecutionError
// ---------------------------------------------------------------------------

/// Terminal failure of an engine submission.
///
/// Surfaced to the caller only when the engine has no fallback to run or the
/// fallback itself failed; otherwise the engine absorbs the primary failure
/// and the fallback result is returned instead. Stream submissions emit the
/// same taxonomy as terminal stream items.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The primary body failed and no fallback was bound.
    #[error("primary execution failed: {source}")]
    PrimaryFailed {
        #[source]
        source: BoxError,
    },

    /// The primary body failed and the bound fallback failed too.
    #[error("fallback failed ({fallback}) after primary failure ({primary})")]
    FallbackFailed {
        primary: BoxError,
        #[source]
        fallback: BoxError,
    },

    /// The circuit is open; the engine skipped execution entirely.
    #[error("execution short-circuited: circuit is open")]
    ShortCircuited,

    /// The engine's admission control refused the submission.
    #[error("execution rejected: concurrency limit reached")]
    Rejected,
}

// ---------------------------------------------------------------------------
// DispatchError
// ---------------------------------------------------------------------------

/// Local failure raised before any engine submission.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A fallback identifier was configured but no candidate with that name
    /// and an identical signature exists. Fail fast rather than silently
    /// dispatching without the fallback.
    #[error("operation `{operation}`: cannot resolve fallback `{fallback}`: {detail}")]
    Resolution {
        operation: String,
        fallback: String,
        detail: String,
    },

    /// The operation's declared return shape is neither a single value nor a
    /// stream, or does not match the registration entry point used.
    #[error("operation `{operation}`: return shape `{declared}` is not dispatchable")]
    UnsupportedShape {
        operation: String,
        declared: String,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_failed_exposes_the_cause() {
        let err = ExecutionError::PrimaryFailed {
            source: "boom".into(),
        };
        assert_eq!(err.to_string(), "primary execution failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn fallback_failed_names_both_causes() {
        let err = ExecutionError::FallbackFailed {
            primary: "blank id".into(),
            fallback: "fallback store down".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("blank id"));
        assert!(msg.contains("fallback store down"));
    }

    #[test]
    fn resolution_error_names_operation_and_identifier() {
        let err = DispatchError::Resolution {
            operation: "get_user".to_string(),
            fallback: "static_fallback".to_string(),
            detail: "no candidate with that name".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("get_user"));
        assert!(msg.contains("static_fallback"));
    }
}
