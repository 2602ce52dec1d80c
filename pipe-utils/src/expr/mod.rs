//! Expression builders: the `it` placeholder and the `obj` method caller.
//!
//! An [`It`] records operations applied to a placeholder and replays them
//! against whatever value it is later evaluated with:
//!
//! ```rust
//! use pipe_utils::prelude::*;
//! use serde_json::json;
//!
//! let is_even = (it() % 2).eq(0);
//! assert_eq!(is_even.eval(&json!(4)).unwrap(), json!(true));
//! assert_eq!(is_even.eval(&json!(5)).unwrap(), json!(false));
//!
//! let total = Pipe::new(json!({"price": 4, "qty": 3}))
//!     | it().attr("price") * it().attr("qty");
//! assert_eq!(total.resolve().unwrap(), json!(12));
//! ```
//!
//! Builders operate on [`serde_json::Value`]s; see [`value_ops`] for how
//! each operator treats them.
//!
//! Every builder remembers the root it was written against. All placeholder
//! builders share one root, so `it().attr("a") + it().attr("b")` reads both
//! fields of the same input. Builders made by [`It::from_fn`] get a fresh
//! root; combining builders with different roots yields a builder that fails
//! with [`ExprError::MixedRoots`].

mod methods;
mod obj;
mod ops;
pub mod value_ops;


pub use methods::{method_registry, register_method, MethodFn, MethodRegistry};
pub use obj::{obj, MethodCall, Obj};

use crate::errors::ExprError;
use crate::pipe::{Pipe, Step};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;
use value_ops::{BinaryOp, UnaryOp};

type ExprFn = Arc<dyn Fn(&Value) -> Result<Value, ExprError> + Send + Sync>;

/// A deferred unary function built from operations on a placeholder.
#[derive(Clone)]
pub struct It {
    root: Uuid,
    op: ExprFn,
    repr: Arc<str>,
}

/// Returns the identity placeholder.
#[must_use]
pub fn it() -> It {
    It::new()
}

impl It {
    /// Creates the identity placeholder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Uuid::nil(),
            op: Arc::new(|value| Ok(value.clone())),
            repr: Arc::from("it"),
        }
    }

    /// Wraps a custom operation as a builder with its own root.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ExprError> + Send + Sync + 'static,
    {
        let root = Uuid::new_v4();
        Self {
            root,
            op: Arc::new(func),
            repr: Arc::from(format!("fn#{}", &root.simple().to_string()[..8])),
        }
    }

    /// Builds a placeholder-rooted builder from a raw operation.
    pub(crate) fn placeholder_op<F>(repr: String, func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ExprError> + Send + Sync + 'static,
    {
        Self {
            root: Uuid::nil(),
            op: Arc::new(func),
            repr: Arc::from(repr),
        }
    }

    /// Returns the root this builder was written against.
    #[must_use]
    pub const fn root(&self) -> Uuid {
        self.root
    }

    /// Returns true if the builder is rooted at the shared placeholder.
    #[must_use]
    pub fn is_placeholder_rooted(&self) -> bool {
        self.root.is_nil()
    }

    /// Evaluates the recorded operations against `input`.
    pub fn eval(&self, input: &Value) -> Result<Value, ExprError> {
        (self.op)(input)
    }

    /// Evaluates against anything convertible to a value.
    pub fn call(&self, input: impl Into<Value>) -> Result<Value, ExprError> {
        self.eval(&input.into())
    }

    /// Turns the builder into a plain closure.
    pub fn into_fn(self) -> impl Fn(&Value) -> Result<Value, ExprError> + Clone + Send + Sync + 'static {
        move |value: &Value| self.eval(value)
    }

    fn derive<F>(&self, repr: String, func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ExprError> + Send + Sync + 'static,
    {
        Self {
            root: self.root,
            op: Arc::new(func),
            repr: Arc::from(repr),
        }
    }

    fn mixed_roots(&self, others: &[&Operand]) -> Option<Self> {
        let foreign = others.iter().find_map(|operand| match operand {
            Operand::Expr(expr) if expr.root != self.root => Some(expr),
            _ => None,
        })?;
        warn!(
            left = %self,
            right = %foreign,
            "combining expressions written against different roots"
        );
        Some(self.derive(format!("<mixed {self} {foreign}>"), |_| Err(ExprError::MixedRoots)))
    }

    fn unary(&self, repr: String, apply: UnaryOp) -> Self {
        let inner = Arc::clone(&self.op);
        self.derive(repr, move |input| apply(&inner(input)?))
    }

    /// `self <op> other`.
    pub(crate) fn binary(&self, symbol: &str, other: Operand, apply: BinaryOp) -> Self {
        let repr = format!("({self} {symbol} {other})");
        self.with_operand(repr, other, apply)
    }

    /// `other <op> self`.
    pub(crate) fn reflected(&self, symbol: &str, other: Operand, apply: BinaryOp) -> Self {
        let repr = format!("({other} {symbol} {self})");
        self.with_operand(repr, other, move |own, other| apply(other, own))
    }

    fn with_operand<F>(&self, repr: String, other: Operand, apply: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<Value, ExprError> + Send + Sync + 'static,
    {
        if let Some(mixed) = self.mixed_roots(&[&other]) {
            return mixed;
        }
        let inner = Arc::clone(&self.op);
        self.derive(repr, move |input| {
            let own = inner(input)?;
            let other = other.resolve(input)?;
            apply(&own, &other)
        })
    }

    /// `self < other`.
    #[must_use]
    pub fn lt(&self, other: impl Into<Operand>) -> Self {
        self.binary("<", other.into(), value_ops::lt)
    }

    /// `self <= other`.
    #[must_use]
    pub fn le(&self, other: impl Into<Operand>) -> Self {
        self.binary("<=", other.into(), value_ops::le)
    }

    /// `self > other`.
    #[must_use]
    pub fn gt(&self, other: impl Into<Operand>) -> Self {
        self.binary(">", other.into(), value_ops::gt)
    }

    /// `self >= other`.
    #[must_use]
    pub fn ge(&self, other: impl Into<Operand>) -> Self {
        self.binary(">=", other.into(), value_ops::ge)
    }

    /// `self == other`, with numeric-aware equality.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn eq(&self, other: impl Into<Operand>) -> Self {
        self.binary("==", other.into(), value_ops::eq)
    }

    /// `self != other`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn ne(&self, other: impl Into<Operand>) -> Self {
        self.binary("!=", other.into(), value_ops::ne)
    }

    /// `self // other`.
    #[must_use]
    pub fn floor_div(&self, other: impl Into<Operand>) -> Self {
        self.binary("//", other.into(), value_ops::floor_div)
    }

    /// `self @ other`.
    #[must_use]
    pub fn matmul(&self, other: impl Into<Operand>) -> Self {
        self.binary("@", other.into(), value_ops::matmul)
    }

    /// `self ** exponent`.
    #[must_use]
    pub fn pow(&self, exponent: impl Into<Operand>) -> Self {
        self.binary("**", exponent.into(), value_ops::pow)
    }

    /// `pow(self, exponent, modulus)`.
    #[must_use]
    pub fn pow_mod(&self, exponent: impl Into<Operand>, modulus: impl Into<Operand>) -> Self {
        let (exponent, modulus) = (exponent.into(), modulus.into());
        if let Some(mixed) = self.mixed_roots(&[&exponent, &modulus]) {
            return mixed;
        }
        let inner = Arc::clone(&self.op);
        self.derive(format!("pow({self}, {exponent}, {modulus})"), move |input| {
            let base = inner(input)?;
            let exponent = exponent.resolve(input)?;
            let modulus = modulus.resolve(input)?;
            value_ops::pow_mod(&base, &exponent, &modulus)
        })
    }

    /// `divmod(self, other)`.
    #[must_use]
    pub fn divmod(&self, other: impl Into<Operand>) -> Self {
        let other = other.into();
        let repr = format!("divmod({self}, {other})");
        self.with_operand(repr, other, value_ops::divmod)
    }

    /// `abs(self)`.
    #[must_use]
    pub fn abs(&self) -> Self {
        self.unary(format!("abs({self})"), value_ops::abs)
    }

    /// `+self`.
    #[must_use]
    pub fn pos(&self) -> Self {
        self.unary(format!("+{self}"), value_ops::pos)
    }

    /// `-self`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn neg(&self) -> Self {
        self.unary(format!("-{self}"), value_ops::neg)
    }

    /// `~self`.
    #[must_use]
    pub fn invert(&self) -> Self {
        self.unary(format!("~{self}"), value_ops::invert)
    }

    /// `self[key]`.
    #[must_use]
    pub fn index(&self, key: impl Into<Operand>) -> Self {
        let key = key.into();
        let repr = format!("{self}[{key}]");
        self.with_operand(repr, key, value_ops::index)
    }

    /// `self.name`.
    #[must_use]
    pub fn attr(&self, name: impl Into<String>) -> Self {
        let name: String = name.into();
        let inner = Arc::clone(&self.op);
        let repr = format!("{self}.{name}");
        self.derive(repr, move |input| value_ops::attr(&inner(input)?, &name))
    }

    /// `other // self`.
    #[must_use]
    pub fn rfloor_div(&self, other: impl Into<Operand>) -> Self {
        self.reflected("//", other.into(), value_ops::floor_div)
    }

    /// `other @ self`.
    #[must_use]
    pub fn rmatmul(&self, other: impl Into<Operand>) -> Self {
        self.reflected("@", other.into(), value_ops::matmul)
    }

    /// `base ** self`.
    #[must_use]
    pub fn rpow(&self, base: impl Into<Operand>) -> Self {
        self.reflected("**", base.into(), value_ops::pow)
    }

    /// `divmod(other, self)`.
    #[must_use]
    pub fn rdivmod(&self, other: impl Into<Operand>) -> Self {
        let other = other.into();
        let repr = format!("divmod({other}, {self})");
        self.with_operand(repr, other, |own, other| value_ops::divmod(other, own))
    }

    /// `other + self`.
    #[must_use]
    pub fn radd(&self, other: impl Into<Operand>) -> Self {
        self.reflected("+", other.into(), value_ops::add)
    }

    /// `other - self`.
    #[must_use]
    pub fn rsub(&self, other: impl Into<Operand>) -> Self {
        self.reflected("-", other.into(), value_ops::sub)
    }

    /// `other * self`.
    #[must_use]
    pub fn rmul(&self, other: impl Into<Operand>) -> Self {
        self.reflected("*", other.into(), value_ops::mul)
    }

    /// `other / self`.
    #[must_use]
    pub fn rdiv(&self, other: impl Into<Operand>) -> Self {
        self.reflected("/", other.into(), value_ops::div)
    }

    /// `other % self`.
    #[must_use]
    pub fn rrem(&self, other: impl Into<Operand>) -> Self {
        self.reflected("%", other.into(), value_ops::rem)
    }

    /// `other & self`.
    #[must_use]
    pub fn rbitand(&self, other: impl Into<Operand>) -> Self {
        self.reflected("&", other.into(), value_ops::bitand)
    }

    /// `other | self`.
    #[must_use]
    pub fn rbitor(&self, other: impl Into<Operand>) -> Self {
        self.reflected("|", other.into(), value_ops::bitor)
    }

    /// `other ^ self`.
    #[must_use]
    pub fn rbitxor(&self, other: impl Into<Operand>) -> Self {
        self.reflected("^", other.into(), value_ops::bitxor)
    }

    /// `other << self`.
    #[must_use]
    pub fn rshl(&self, other: impl Into<Operand>) -> Self {
        self.reflected("<<", other.into(), value_ops::shl)
    }

    /// `other >> self`.
    #[must_use]
    pub fn rshr(&self, other: impl Into<Operand>) -> Self {
        self.reflected(">>", other.into(), value_ops::shr)
    }
}

impl Default for It {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for It {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

impl fmt::Debug for It {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("It")
            .field("root", &self.root)
            .field("expr", &&*self.repr)
            .finish_non_exhaustive()
    }
}

impl Step<Value> for It {
    type Output = Value;

    fn run(self, pipe: &Pipe<Value>) -> Pipe<Value> {
        pipe.try_then(|value| self.eval(value))
    }
}

/// The right-hand side of an expression operation.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A fixed value.
    Value(Value),
    /// Another builder, evaluated against the same input.
    Expr(It),
}

impl Operand {
    fn resolve(&self, input: &Value) -> Result<Cow<'_, Value>, ExprError> {
        match self {
            Self::Value(value) => Ok(Cow::Borrowed(value)),
            Self::Expr(expr) => expr.eval(input).map(Cow::Owned),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

impl From<It> for Operand {
    fn from(expr: It) -> Self {
        Self::Expr(expr)
    }
}

impl From<&It> for Operand {
    fn from(expr: &It) -> Self {
        Self::Expr(expr.clone())
    }
}

macro_rules! operand_from_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )+
    };
}

operand_from_value!(i32, i64, u32, u64, f32, f64, bool, &str, String, Value, Vec<Value>);
