//! Errors raised while running host calls on a state.
use thiserror::Error;

use crate::Type;

/// A boxed error returned by a host callable.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An error raised while calling a function on a state.
///
/// Every variant leaves the caller's stack balanced: the function and
/// its arguments are discarded before the error is returned.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RuntimeError {
    /// Growing the stack would exceed the configured limit.
    #[error("stack overflow: {requested} more slot(s) would exceed the limit of {limit}")]
    StackOverflow {
        /// Slots that were requested.
        requested: usize,
        /// The configured maximum.
        limit: usize,
    },

    /// Too many nested native calls.
    #[error("call depth limit of {0} exceeded")]
    CallDepthExceeded(usize),

    /// The called value is not a function.
    #[error("attempt to call a {0} value")]
    NotCallable(&'static str),

    /// A table operation was applied to a value that is not a table.
    #[error("attempt to index a {0} value")]
    NotIndexable(&'static str),

    /// A stack index does not address a live slot.
    #[error("invalid stack index {0}")]
    InvalidIndex(i32),

    /// A native closure was invoked without its callable upvalue.
    ///
    /// This is never caused by script input; it means the closure was not
    /// built by the binder.
    #[error("native closure has no bound callable in upvalue 1")]
    MissingCallable,

    /// A member call did not find a usable receiver at stack position 1.
    #[error("member call on `{owner}` without a valid receiver at stack position 1")]
    MissingReceiver {
        /// The receiver type name.
        owner: &'static str,
    },

    /// A typed call received a different number of results.
    #[error("expected {expected} result value(s), got {got}")]
    ResultCount {
        /// Results the caller asked for.
        expected: usize,
        /// Results the callee produced.
        got: usize,
    },

    /// A typed call received a result it cannot convert.
    #[error("expected a result of type {expected}, got {got}")]
    ResultType {
        /// The type the caller asked for.
        expected: Type,
        /// The type of the value the callee produced.
        got: Type,
    },

    /// An error returned by a host callable.
    #[error(transparent)]
    User(BoxError),
}

impl RuntimeError {
    /// Wraps an error returned by a host callable.
    pub fn user(error: impl Into<BoxError>) -> Self {
        Self::User(error.into())
    }

    /// Attempts to downcast a user error to a concrete type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::User(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Whether this error was raised by a host callable.
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, PartialEq)]
    struct E;

    impl fmt::Display for E {
        fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "E")
        }
    }

    impl std::error::Error for E {}

    #[test]
    fn user_errors_downcast() {
        let err = RuntimeError::user(E);
        assert!(err.is_user());
        assert_eq!(err.downcast_ref::<E>(), Some(&E));
        assert_eq!(err.to_string(), "E");
    }

    #[test]
    fn display_missing_receiver() {
        let err = RuntimeError::MissingReceiver { owner: "Person" };
        assert_eq!(
            err.to_string(),
            "member call on `Person` without a valid receiver at stack position 1"
        );
        assert!(err.downcast_ref::<E>().is_none());
    }
}
