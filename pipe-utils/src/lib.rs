//! # pipe-utils
//!
//! Chainable, error-capturing pipes and placeholder expression builders.
//!
//! - **Pipes**: thread a value through steps with [`pipe::Pipe`]; the first
//!   failing step captures its error and every later step is skipped until a
//!   matching `catch` or a terminal `resolve`
//! - **Expressions**: build unary functions from the [`expr::it`]
//!   placeholder with ordinary operators, and call registered methods with
//!   [`expr::obj`]
//! - **Plans**: describe a pipe as JSON and run it with [`plan::PipePlan`]
//!
//! ## Quick Start
//!
//! ```rust
//! use pipe_utils::prelude::*;
//! use serde_json::json;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("cannot divide by zero")]
//! struct DivideByZero;
//!
//! let reciprocals = |values: &Vec<i32>| {
//!     values
//!         .iter()
//!         .map(|&v| if v == 0 { Err(DivideByZero) } else { Ok(1.0 / f64::from(v)) })
//!         .collect::<Result<Vec<f64>, _>>()
//! };
//!
//! let result = Pipe::new(vec![1, 0, 2])
//!     .try_then(reciprocals)
//!     .catch(kind::<DivideByZero>(), |_| vec![0.0])
//!     .resolve();
//! assert_eq!(result.unwrap(), vec![0.0]);
//!
//! let doubled = Pipe::new(json!(21)) | it() * 2;
//! assert_eq!(doubled.resolve().unwrap(), json!(42));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod errors;
pub mod expr;
pub mod pipe;
pub mod plan;
pub mod testing;
pub mod values;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::{ExprError, ExprErrorKind, PipeError, StepError};
    pub use crate::expr::{it, method_registry, obj, It, MethodRegistry, Obj, Operand};
    pub use crate::pipe::{
        fallible, kind, matching, AnyError, Catch, ErrorMatcher, Pipe, RaisePolicy, Step, Then,
        TryThen,
    };
    pub use crate::plan::{PipePlan, StepSpec};
}
