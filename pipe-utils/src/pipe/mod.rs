//! The error-capturing pipe.
//!
//! A [`Pipe`] holds either a success value or a captured [`StepError`].
//! Steps applied to a successful pipe run immediately; a step that fails
//! moves the result into the error state, and every later step is skipped
//! until a matching [`Pipe::catch`] recovers or a terminal method hands the
//! error back:
//!
//! ```rust
//! use pipe_utils::prelude::*;
//!
//! let length = Pipe::new("42")
//!     .try_then(|s: &&str| s.parse::<i64>())
//!     .then(|n: &i64| n * 2)
//!     .resolve_or(-1)
//!     .unwrap();
//! assert_eq!(length, 84);
//! ```
//!
//! Pipes are immutable. Every transition borrows the current pipe and
//! returns a new one, so intermediate pipes can be kept and branched from.

mod matcher;
mod step;

#[cfg(test)]
mod pipe_tests;

pub use matcher::{kind, matching, AnyError, ErrorMatcher, Kind, Predicate};
pub use step::{fallible, Catch, Fallible, Raise, Step, Then, TryThen};

use crate::errors::StepError;
use std::any::type_name;
use std::convert::Infallible;
use std::error::Error as StdError;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;
use tracing::{debug, trace};

/// A value threaded through pipeline steps, or the error that stopped it.
pub struct Pipe<T> {
    state: Result<Arc<T>, StepError>,
}

impl<T> Pipe<T> {
    /// Creates a successful pipe holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            state: Ok(Arc::new(value)),
        }
    }

    /// Creates a failed pipe holding `error`.
    #[must_use]
    pub const fn from_error(error: StepError) -> Self {
        Self { state: Err(error) }
    }

    /// Creates a pipe from a result, capturing the error if there is one.
    #[must_use]
    pub fn from_result<E>(result: Result<T, E>) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        match result {
            Ok(value) => Self::new(value),
            Err(error) => Self::from_error(StepError::new(error)),
        }
    }

    /// Returns true if the pipe holds a value.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.state.is_ok()
    }

    /// Returns true if the pipe holds a captured error.
    #[must_use]
    pub const fn is_err(&self) -> bool {
        self.state.is_err()
    }

    /// Returns the value, if the pipe is successful.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.state.as_ref().ok().map(|value| &**value)
    }

    /// Returns the captured error, if the pipe has failed.
    #[must_use]
    pub fn error(&self) -> Option<&StepError> {
        self.state.as_ref().err()
    }

    /// Borrows the state as a result.
    pub fn as_result(&self) -> Result<&T, &StepError> {
        match &self.state {
            Ok(value) => Ok(&**value),
            Err(error) => Err(error),
        }
    }

    /// Applies a fallible step.
    ///
    /// This is the primitive every other transition goes through. On a
    /// failed pipe `func` is not called and the captured error is carried
    /// over unchanged. Otherwise `func` receives the current value; its
    /// error, if any, is captured as is.
    pub fn try_then<R, E, F>(&self, func: F) -> Pipe<R>
    where
        F: FnOnce(&T) -> Result<R, E>,
        E: StdError + Send + Sync + 'static,
    {
        self.combine(type_name::<F>(), func)
    }

    /// Applies an infallible step.
    pub fn then<R, F>(&self, func: F) -> Pipe<R>
    where
        F: FnOnce(&T) -> R,
    {
        self.combine(type_name::<F>(), |value| Ok::<R, Infallible>(func(value)))
    }

    /// Applies an infallible step with extra arguments.
    pub fn then_with<R, A, F>(&self, func: F, args: A) -> Pipe<R>
    where
        F: FnOnce(&T, A) -> R,
    {
        self.combine(type_name::<F>(), |value| Ok::<R, Infallible>(func(value, args)))
    }

    /// Applies a fallible step with extra arguments.
    pub fn try_then_with<R, E, A, F>(&self, func: F, args: A) -> Pipe<R>
    where
        F: FnOnce(&T, A) -> Result<R, E>,
        E: StdError + Send + Sync + 'static,
    {
        self.combine(type_name::<F>(), |value| func(value, args))
    }

    /// Applies any [`Step`]: a closure, a descriptor, a handler or a tuple.
    ///
    /// `pipe.apply(step)` is the method form of `pipe | step`.
    pub fn apply<S: Step<T>>(&self, step: S) -> Pipe<S::Output> {
        step.run(self)
    }

    /// Recovers from a captured error that `matcher` accepts.
    ///
    /// The handler's result becomes the new value. Successful pipes and
    /// errors the matcher rejects pass through unchanged.
    #[must_use]
    pub fn catch<M, H>(&self, matcher: M, handler: H) -> Self
    where
        M: ErrorMatcher,
        H: FnOnce(&StepError) -> T,
    {
        match &self.state {
            Err(error) if matcher.matches(error) => {
                debug!(error = %error, "caught pipeline error");
                Self::new(handler(error))
            }
            _ => self.clone(),
        }
    }

    fn combine<R, E, F>(&self, step: &'static str, func: F) -> Pipe<R>
    where
        F: FnOnce(&T) -> Result<R, E>,
        E: StdError + Send + Sync + 'static,
    {
        let value = match &self.state {
            Ok(value) => value,
            Err(error) => {
                trace!(step = step, "skipping step on failed pipe");
                return Pipe::from_error(error.clone());
            }
        };

        match func(&**value) {
            Ok(result) => Pipe::new(result),
            Err(error) => {
                let error = StepError::new(error);
                debug!(step = step, error = %error, "pipeline step failed");
                Pipe::from_error(error)
            }
        }
    }
}

impl<T: Clone> Pipe<T> {
    /// Returns the value, or the captured error.
    ///
    /// The value is only cloned when other pipes still share it.
    pub fn resolve(self) -> Result<T, StepError> {
        match self.state {
            Ok(value) => Ok(Arc::unwrap_or_clone(value)),
            Err(error) => {
                debug!(error = %error, "resolved failed pipe");
                Err(error)
            }
        }
    }

    /// Returns the value, or `default` if the pipe has failed.
    pub fn resolve_or(self, default: T) -> Result<T, StepError> {
        self.resolve_or_catching(default, AnyError)
    }

    /// Returns the value, or `default` if the captured error matches `catch`.
    ///
    /// An error the matcher rejects is returned instead of the default.
    pub fn resolve_or_catching<M: ErrorMatcher>(self, default: T, catch: M) -> Result<T, StepError> {
        match self.state {
            Ok(value) => Ok(Arc::unwrap_or_clone(value)),
            Err(error) if catch.matches(&error) => Ok(default),
            Err(error) => {
                debug!(error = %error, "captured error not covered by default");
                Err(error)
            }
        }
    }

    /// Returns the value, or `error` raised from the captured error.
    pub fn resolve_or_raise<E>(self, error: E) -> Result<T, StepError>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.resolve_or_raise_with(error, RaisePolicy::new())
    }

    /// Returns the value, or raises `error` as configured by `policy`.
    ///
    /// When the captured error matches `policy.catch`, `error` is returned,
    /// with the captured error as its originating error if `policy.chained`
    /// is set. A captured error the policy does not match is returned as is.
    pub fn resolve_or_raise_with<E, M>(self, error: E, policy: RaisePolicy<M>) -> Result<T, StepError>
    where
        E: StdError + Send + Sync + 'static,
        M: ErrorMatcher,
    {
        match self.state {
            Ok(value) => Ok(Arc::unwrap_or_clone(value)),
            Err(captured) if policy.catch.matches(&captured) => {
                let raised = StepError::new(error);
                debug!(
                    error = %raised,
                    captured = %captured,
                    chained = policy.chained,
                    "raising replacement error"
                );
                if policy.chained {
                    Err(raised.caused_by(captured))
                } else {
                    Err(raised.without_cause())
                }
            }
            Err(captured) => Err(captured),
        }
    }
}

impl<T> Clone for Pipe<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> From<T> for Pipe<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Pipe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            Ok(value) => f.debug_tuple("Pipe::Success").field(value).finish(),
            Err(error) => f.debug_tuple("Pipe::Error").field(error).finish(),
        }
    }
}

impl<T, S: Step<T>> BitOr<S> for Pipe<T> {
    type Output = Pipe<S::Output>;

    fn bitor(self, step: S) -> Self::Output {
        step.run(&self)
    }
}

impl<T, S: Step<T>> BitOr<S> for &Pipe<T> {
    type Output = Pipe<S::Output>;

    fn bitor(self, step: S) -> Self::Output {
        step.run(self)
    }
}

/// How [`Pipe::resolve_or_raise_with`] treats a captured error.
#[derive(Debug, Clone, Copy)]
pub struct RaisePolicy<M = AnyError> {
    /// Which captured errors are replaced.
    pub catch: M,
    /// Whether the replacement records the captured error as its cause.
    pub chained: bool,
}

impl RaisePolicy {
    /// Replaces every error and chains it.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            catch: AnyError,
            chained: true,
        }
    }
}

impl Default for RaisePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> RaisePolicy<M> {
    /// Only replaces errors matching `catch`.
    #[must_use]
    pub fn with_catch<N: ErrorMatcher>(self, catch: N) -> RaisePolicy<N> {
        RaisePolicy {
            catch,
            chained: self.chained,
        }
    }

    /// Sets whether the replacement is chained to the captured error.
    #[must_use]
    pub fn with_chained(mut self, chained: bool) -> Self {
        self.chained = chained;
        self
    }
}
