//! Operation descriptors: what the discovery collaborator tells us about an
//! intercepted operation.
//!
//! A descriptor carries the declared name, the declared return shape, the
//! ordered parameter-type list, and the optionally configured fallback
//! identifier. It is built once at registration time; per-call state is
//! reduced to the live arguments.

use std::any::TypeId;

use breakwater_core::DispatchError;

// ---------------------------------------------------------------------------
// ReturnShape
// ---------------------------------------------------------------------------

/// The two invocation contracts the dispatcher supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// A single value, awaited to completion.
    Value,
    /// A lazy, possibly-infinite, cancellable item sequence.
    Stream,
}

impl ReturnShape {
    /// Parse a raw declared-shape tag from a discovery collaborator.
    ///
    /// Anything other than the two known shapes fails with
    /// [`DispatchError::UnsupportedShape`] before any engine submission can
    /// happen.
    pub fn parse(operation: &str, declared: &str) -> Result<Self, DispatchError> {
        match declared {
            "value" => Ok(Self::Value),
            "stream" => Ok(Self::Stream),
            other => Err(DispatchError::UnsupportedShape {
                operation: operation.to_string(),
                declared: other.to_string(),
            }),
        }
    }

    /// Canonical tag for this shape.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Stream => "stream",
        }
    }
}

impl std::fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ParamList
// ---------------------------------------------------------------------------

/// Argument tuple of a protected operation.
///
/// Supplies the ordered parameter-type list used for exact signature
/// matching during fallback resolution. `Clone` is required because a bound
/// fallback receives its own copy of the exact same arguments.
pub trait ParamList: Clone + Send + 'static {
    /// `TypeId` of each parameter, in declaration order.
    fn type_ids() -> Vec<TypeId>;

    /// Type name of each parameter, in declaration order. Diagnostics only.
    fn type_names() -> Vec<&'static str>;
}

/// Implement `ParamList` for argument tuples up to eight parameters.
macro_rules! impl_param_list {
    ($($param:ident),*) => {
        impl<$($param),*> ParamList for ($($param,)*)
        where
            $($param: Clone + Send + 'static,)*
        {
            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$param>()),*]
            }

            fn type_names() -> Vec<&'static str> {
                vec![$(std::any::type_name::<$param>()),*]
            }
        }
    };
}

impl_param_list!();
impl_param_list!(P1);
impl_param_list!(P1, P2);
impl_param_list!(P1, P2, P3);
impl_param_list!(P1, P2, P3, P4);
impl_param_list!(P1, P2, P3, P4, P5);
impl_param_list!(P1, P2, P3, P4, P5, P6);
impl_param_list!(P1, P2, P3, P4, P5, P6, P7);
impl_param_list!(P1, P2, P3, P4, P5, P6, P7, P8);

// ---------------------------------------------------------------------------
// OperationDescriptor
// ---------------------------------------------------------------------------

/// Registration-time description of a protected operation.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    name: String,
    shape: ReturnShape,
    param_types: Vec<TypeId>,
    param_names: Vec<&'static str>,
    fallback: Option<String>,
    receiver: Option<String>,
}

impl OperationDescriptor {
    /// Describe an operation with the given shape and argument tuple `A`.
    #[must_use]
    pub fn new<A: ParamList>(name: &str, shape: ReturnShape) -> Self {
        Self {
            name: name.to_string(),
            shape,
            param_types: A::type_ids(),
            param_names: A::type_names(),
            fallback: None,
            receiver: None,
        }
    }

    /// Describe a single-value operation.
    #[must_use]
    pub fn value<A: ParamList>(name: &str) -> Self {
        Self::new::<A>(name, ReturnShape::Value)
    }

    /// Describe a streaming operation.
    #[must_use]
    pub fn stream<A: ParamList>(name: &str) -> Self {
        Self::new::<A>(name, ReturnShape::Stream)
    }

    /// Configure the fallback identifier.
    ///
    /// A blank or whitespace-only identifier counts as unconfigured.
    #[must_use]
    pub fn with_fallback(mut self, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            self.fallback = None;
        } else {
            self.fallback = Some(identifier);
        }
        self
    }

    /// Label the receiver this operation lives on. Only consulted under
    /// per-receiver key scoping; ignored for the default shared keys.
    #[must_use]
    pub fn with_receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }

    /// The operation's declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared return shape.
    #[must_use]
    pub fn shape(&self) -> ReturnShape {
        self.shape
    }

    /// The configured fallback identifier, if any.
    #[must_use]
    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    /// The receiver label, if any.
    #[must_use]
    pub fn receiver(&self) -> Option<&str> {
        self.receiver.as_deref()
    }

    /// Ordered parameter `TypeId`s.
    #[must_use]
    pub fn param_types(&self) -> &[TypeId] {
        &self.param_types
    }

    /// Ordered parameter type names, for diagnostics.
    #[must_use]
    pub fn param_names(&self) -> &[&'static str] {
        &self.param_names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_the_two_known_shapes() {
        assert_eq!(
            ReturnShape::parse("get_user", "value").unwrap(),
            ReturnShape::Value
        );
        assert_eq!(
            ReturnShape::parse("watch_user", "stream").unwrap(),
            ReturnShape::Stream
        );
    }

    #[test]
    fn parse_rejects_unknown_shapes_by_name() {
        let err = ReturnShape::parse("get_user", "future").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("get_user"));
        assert!(msg.contains("future"));
    }

    #[test]
    fn blank_fallback_identifier_counts_as_unconfigured() {
        let descriptor =
            OperationDescriptor::value::<(String, String)>("get_user").with_fallback("   ");
        assert_eq!(descriptor.fallback(), None);

        let descriptor = OperationDescriptor::value::<(String, String)>("get_user")
            .with_fallback("static_fallback");
        assert_eq!(descriptor.fallback(), Some("static_fallback"));
    }

    #[test]
    fn param_lists_record_types_in_declaration_order() {
        let descriptor = OperationDescriptor::value::<(String, u32)>("mixed");
        assert_eq!(
            descriptor.param_types(),
            &[TypeId::of::<String>(), TypeId::of::<u32>()],
        );
        assert_eq!(descriptor.param_names().len(), 2);
    }

    #[test]
    fn empty_param_list_is_allowed() {
        let descriptor = OperationDescriptor::stream::<()>("heartbeat");
        assert!(descriptor.param_types().is_empty());
    }
}
