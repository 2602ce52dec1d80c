//! The `obj` method-call builder.
//!
//! `obj().method("split").call([","])` builds the expression
//! `it.split(",")`. The method is looked up by name in a
//! [`MethodRegistry`] each time the expression is evaluated, so methods
//! registered later are picked up and unknown names fail at evaluation with
//! [`crate::errors::ExprError::UnknownMethod`].
//!
//! Method calls apply to the raw input only: the result is an [`It`] that
//! supports further operators, indexing and attribute access, but not a
//! second method call.

use super::methods::{method_registry, MethodRegistry};
use super::It;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Entry point for method-call expressions.
#[derive(Clone)]
pub struct Obj {
    registry: Arc<MethodRegistry>,
}

/// Returns a method-call builder backed by the global registry.
#[must_use]
pub fn obj() -> Obj {
    Obj::new()
}

impl Obj {
    /// Creates a builder backed by the global registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(method_registry())
    }

    /// Creates a builder backed by `registry`.
    #[must_use]
    pub const fn with_registry(registry: Arc<MethodRegistry>) -> Self {
        Self { registry }
    }

    /// Names the method to call.
    #[must_use]
    pub fn method(&self, name: impl Into<String>) -> MethodCall {
        MethodCall {
            registry: Arc::clone(&self.registry),
            name: name.into(),
        }
    }
}

impl Default for Obj {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Obj").field("registry", &self.registry).finish()
    }
}

/// A named method awaiting its arguments.
#[derive(Clone)]
pub struct MethodCall {
    registry: Arc<MethodRegistry>,
    name: String,
}

impl MethodCall {
    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds the call with positional arguments.
    #[must_use]
    pub fn call<I, A>(&self, args: I) -> It
    where
        I: IntoIterator<Item = A>,
        A: Into<Value>,
    {
        self.call_with(args, Map::new())
    }

    /// Builds the call without arguments.
    #[must_use]
    pub fn call_no_args(&self) -> It {
        self.call_with(Vec::<Value>::new(), Map::new())
    }

    /// Builds the call with positional and keyword arguments.
    #[must_use]
    pub fn call_with<I, A>(&self, args: I, kwargs: Map<String, Value>) -> It
    where
        I: IntoIterator<Item = A>,
        A: Into<Value>,
    {
        let args: Vec<Value> = args.into_iter().map(Into::into).collect();
        let repr = format!("it.{}({})", self.name, render_args(&args, &kwargs));

        let registry = Arc::clone(&self.registry);
        let name = self.name.clone();
        It::placeholder_op(repr, move |input| registry.invoke(&name, input, &args, &kwargs))
    }
}

impl fmt::Debug for MethodCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodCall")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn render_args(args: &[Value], kwargs: &Map<String, Value>) -> String {
    args.iter()
        .map(ToString::to_string)
        .chain(kwargs.iter().map(|(key, value)| format!("{key}={value}")))
        .collect::<Vec<_>>()
        .join(", ")
}
