//! Error types for pipe-utils.
//!
//! Three families live here:
//! - [`StepError`], the shared handle a pipe captures when a step fails and
//!   hands back from its terminal methods;
//! - [`PipeError`], synchronous failures of the dynamic step layer (invalid
//!   step kinds, plan loading);
//! - [`ExprError`], failures raised while evaluating expression builders and
//!   builtin methods.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error accepted from step functions.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// An error captured from a pipeline step.
///
/// The handle shares the exact error value the step returned, so cloning a
/// `StepError` (or a failed pipe) never re-wraps it: [`StepError::ptr_eq`]
/// tells whether two handles refer to the same captured error.
///
/// A handle may carry an originating error, the explicit "caused by" link
/// set by [`crate::pipe::Pipe::resolve_or_raise`]. When present it is what
/// [`std::error::Error::source`] returns.
#[derive(Clone)]
pub struct StepError {
    error: Arc<dyn StdError + Send + Sync + 'static>,
    originating: Option<Arc<StepError>>,
}

impl StepError {
    /// Captures an error.
    ///
    /// Capturing a `StepError` returns it unchanged.
    #[must_use]
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_boxed(Box::new(error))
    }

    /// Captures an already boxed error.
    #[must_use]
    pub fn from_boxed(error: BoxError) -> Self {
        match error.downcast::<Self>() {
            Ok(captured) => *captured,
            Err(error) => Self {
                error: Arc::from(error),
                originating: None,
            },
        }
    }

    /// Captures a plain message as an error.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::from_boxed(message.into())
    }

    /// Returns true if the captured error is an `E`.
    #[must_use]
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.error.is::<E>()
    }

    /// Returns the captured error as an `E`, if it is one.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.error.downcast_ref::<E>()
    }

    /// Returns the captured error.
    #[must_use]
    pub fn as_dyn(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.error
    }

    /// Returns the error this one was raised from, if any.
    #[must_use]
    pub fn originating_error(&self) -> Option<&Self> {
        self.originating.as_deref()
    }

    /// Sets the error this one was raised from.
    #[must_use]
    pub fn caused_by(mut self, cause: Self) -> Self {
        self.originating = Some(Arc::new(cause));
        self
    }

    /// Clears the originating error.
    #[must_use]
    pub fn without_cause(mut self) -> Self {
        self.originating = None;
        self
    }

    /// Returns true if both handles share the same captured error.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.error, &other.error)
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.error, f)
    }
}

impl fmt::Debug for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepError")
            .field("error", &self.error)
            .field("originating", &self.originating)
            .finish()
    }
}

impl StdError for StepError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.originating {
            Some(cause) => Some(&**cause),
            None => self.error.source(),
        }
    }
}

/// Synchronous errors from the dynamic step layer.
#[derive(Debug, Error)]
pub enum PipeError {
    /// A value that cannot be used as a pipeline step.
    #[error("cannot use {found} as a pipeline step")]
    InvalidStepKind {
        /// Description of the rejected value.
        found: String,
    },

    /// A catch handler names a method that is not registered.
    #[error("no method named '{name}' is registered")]
    UnknownCallable {
        /// The missing method name.
        name: String,
    },

    /// A plan document has the wrong shape.
    #[error("invalid plan: {message}")]
    InvalidPlan {
        /// What is wrong with the plan.
        message: String,
    },

    /// A plan could not be parsed as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A plan file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipeError {
    /// Creates an invalid step kind error.
    #[must_use]
    pub fn invalid_step_kind(found: impl Into<String>) -> Self {
        Self::InvalidStepKind {
            found: found.into(),
        }
    }

    /// Creates an unknown callable error.
    #[must_use]
    pub fn unknown_callable(name: impl Into<String>) -> Self {
        Self::UnknownCallable { name: name.into() }
    }

    /// Creates an invalid plan error.
    #[must_use]
    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Self::InvalidPlan {
            message: message.into(),
        }
    }
}

/// Errors raised while evaluating expressions and builtin methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// A binary operation does not support its operand types.
    #[error("unsupported operand types for {op}: '{left}' and '{right}'")]
    UnsupportedOperands {
        /// The operation.
        op: &'static str,
        /// Type of the left operand.
        left: &'static str,
        /// Type of the right operand.
        right: &'static str,
    },

    /// A unary operation does not support its operand type.
    #[error("bad operand type for {op}: '{operand}'")]
    UnsupportedOperand {
        /// The operation.
        op: &'static str,
        /// Type of the operand.
        operand: &'static str,
    },

    /// Division or modulo by zero.
    #[error("division by zero in {op}")]
    ZeroDivision {
        /// The operation.
        op: &'static str,
    },

    /// A numeric result does not fit the value model.
    #[error("numeric result of {op} is out of range")]
    Overflow {
        /// The operation.
        op: &'static str,
    },

    /// Attribute access on a value without that attribute.
    #[error("'{type_name}' value has no attribute '{name}'")]
    MissingAttribute {
        /// Type of the value.
        type_name: &'static str,
        /// The attribute name.
        name: String,
    },

    /// A method call naming no registered method.
    #[error("'{type_name}' value has no method '{name}'")]
    UnknownMethod {
        /// Type of the receiver.
        type_name: &'static str,
        /// The method name.
        name: String,
    },

    /// Sequence index outside the sequence.
    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: i64,
        /// The sequence length.
        len: usize,
    },

    /// Mapping key not present.
    #[error("key '{key}' not found")]
    MissingKey {
        /// The requested key.
        key: String,
    },

    /// Indexing a value that cannot be indexed by the given key.
    #[error("'{type_name}' value is not subscriptable by '{key_type}'")]
    NotSubscriptable {
        /// Type of the value.
        type_name: &'static str,
        /// Type of the key.
        key_type: &'static str,
    },

    /// Right types, wrong value.
    #[error("invalid value for {op}: {reason}")]
    InvalidValue {
        /// The operation or method.
        op: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An expression combines builders written against different roots.
    #[error("expression combines builders with different roots")]
    MixedRoots,
}

impl ExprError {
    /// Creates an unsupported operands error.
    #[must_use]
    pub const fn operands(op: &'static str, left: &'static str, right: &'static str) -> Self {
        Self::UnsupportedOperands { op, left, right }
    }

    /// Creates an unsupported operand error.
    #[must_use]
    pub const fn operand(op: &'static str, operand: &'static str) -> Self {
        Self::UnsupportedOperand { op, operand }
    }

    /// Creates a division by zero error.
    #[must_use]
    pub const fn zero_division(op: &'static str) -> Self {
        Self::ZeroDivision { op }
    }

    /// Creates an overflow error.
    #[must_use]
    pub const fn overflow(op: &'static str) -> Self {
        Self::Overflow { op }
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(op: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            op: op.into(),
            reason: reason.into(),
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ExprErrorKind {
        match self {
            Self::UnsupportedOperands { .. }
            | Self::UnsupportedOperand { .. }
            | Self::NotSubscriptable { .. } => ExprErrorKind::Type,
            Self::ZeroDivision { .. } => ExprErrorKind::ZeroDivision,
            Self::Overflow { .. } => ExprErrorKind::Overflow,
            Self::MissingAttribute { .. } | Self::UnknownMethod { .. } => {
                ExprErrorKind::Attribute
            }
            Self::IndexOutOfRange { .. } => ExprErrorKind::Index,
            Self::MissingKey { .. } => ExprErrorKind::Key,
            Self::InvalidValue { .. } => ExprErrorKind::Value,
            Self::MixedRoots => ExprErrorKind::MixedRoots,
        }
    }
}

/// Coarse classification of [`ExprError`]s, used to catch them by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprErrorKind {
    /// Operand or receiver of the wrong type.
    Type,
    /// Division or modulo by zero.
    ZeroDivision,
    /// Numeric result out of range.
    Overflow,
    /// Missing attribute or method.
    Attribute,
    /// Sequence index out of range.
    Index,
    /// Missing mapping key.
    Key,
    /// Right type, wrong value.
    Value,
    /// Builders from different roots combined.
    MixedRoots,
}

impl fmt::Display for ExprErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type => write!(f, "type"),
            Self::ZeroDivision => write!(f, "zero_division"),
            Self::Overflow => write!(f, "overflow"),
            Self::Attribute => write!(f, "attribute"),
            Self::Index => write!(f, "index"),
            Self::Key => write!(f, "key"),
            Self::Value => write!(f, "value"),
            Self::MixedRoots => write!(f, "mixed_roots"),
        }
    }
}
