//! Step descriptors accepted by [`Pipe::apply`] and the `|` operator.

use super::{ErrorMatcher, Pipe};
use crate::errors::StepError;
use std::error::Error as StdError;
use std::fmt;

/// Something that can be applied to a `Pipe<T>`.
///
/// Implemented for:
/// - closures `FnOnce(&T) -> R` (infallible steps);
/// - [`Fallible`] closures returning `Result<R, E>`;
/// - [`Then`] and [`TryThen`] descriptors carrying extra arguments;
/// - tuples `(f, a1)`, `(f, a1, a2)` and `(f, a1, a2, a3)`, shorthand for a
///   function followed by its extra arguments;
/// - [`Catch`] handlers;
/// - [`Raise`] steps;
/// - [`crate::expr::It`] expressions, on `Pipe<Value>`.
///
/// Anything else is rejected at compile time.
pub trait Step<T> {
    /// The value type of the resulting pipe.
    type Output;

    /// Applies the step to `pipe`.
    fn run(self, pipe: &Pipe<T>) -> Pipe<Self::Output>;
}

impl<T, F, R> Step<T> for F
where
    F: FnOnce(&T) -> R,
{
    type Output = R;

    fn run(self, pipe: &Pipe<T>) -> Pipe<R> {
        pipe.then(self)
    }
}

/// A function plus the extra arguments to call it with.
///
/// The step evaluates `func(&value, args)`. Several arguments travel as a
/// tuple; named options travel as a struct.
#[derive(Clone)]
pub struct Then<F, A> {
    func: F,
    args: A,
}

impl<F, A> Then<F, A> {
    /// Creates a descriptor.
    pub const fn new(func: F, args: A) -> Self {
        Self { func, args }
    }

    /// Returns the extra arguments.
    pub const fn args(&self) -> &A {
        &self.args
    }
}

impl<F, A: fmt::Debug> fmt::Debug for Then<F, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Then")
            .field("func", &std::any::type_name::<F>())
            .field("args", &self.args)
            .finish()
    }
}

impl<T, F, A, R> Step<T> for Then<F, A>
where
    F: FnOnce(&T, A) -> R,
{
    type Output = R;

    fn run(self, pipe: &Pipe<T>) -> Pipe<R> {
        pipe.then_with(self.func, self.args)
    }
}

/// Like [`Then`], for functions that return a `Result`.
#[derive(Clone)]
pub struct TryThen<F, A> {
    func: F,
    args: A,
}

impl<F, A> TryThen<F, A> {
    /// Creates a descriptor.
    pub const fn new(func: F, args: A) -> Self {
        Self { func, args }
    }

    /// Returns the extra arguments.
    pub const fn args(&self) -> &A {
        &self.args
    }
}

impl<F, A: fmt::Debug> fmt::Debug for TryThen<F, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryThen")
            .field("func", &std::any::type_name::<F>())
            .field("args", &self.args)
            .finish()
    }
}

impl<T, F, A, R, E> Step<T> for TryThen<F, A>
where
    F: FnOnce(&T, A) -> Result<R, E>,
    E: StdError + Send + Sync + 'static,
{
    type Output = R;

    fn run(self, pipe: &Pipe<T>) -> Pipe<R> {
        pipe.try_then_with(self.func, self.args)
    }
}

/// A closure whose `Err` should be captured rather than become the value.
#[derive(Clone, Copy)]
pub struct Fallible<F>(F);

impl<F> fmt::Debug for Fallible<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fallible")
            .field(&std::any::type_name::<F>())
            .finish()
    }
}

/// Marks a closure as fallible for use with `|`.
pub const fn fallible<F>(func: F) -> Fallible<F> {
    Fallible(func)
}

impl<T, F, R, E> Step<T> for Fallible<F>
where
    F: FnOnce(&T) -> Result<R, E>,
    E: StdError + Send + Sync + 'static,
{
    type Output = R;

    fn run(self, pipe: &Pipe<T>) -> Pipe<R> {
        pipe.try_then(self.0)
    }
}

/// An error matcher paired with the handler producing the replacement value.
#[derive(Clone)]
pub struct Catch<M, H> {
    matcher: M,
    handler: H,
}

impl<M, H> Catch<M, H> {
    /// Creates a handler descriptor.
    pub const fn new(matcher: M, handler: H) -> Self {
        Self { matcher, handler }
    }

    /// Returns the matcher.
    pub const fn matcher(&self) -> &M {
        &self.matcher
    }
}

impl<M: fmt::Debug, H> fmt::Debug for Catch<M, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catch")
            .field("matcher", &self.matcher)
            .field("handler", &std::any::type_name::<H>())
            .finish()
    }
}

impl<T, M, H> Step<T> for Catch<M, H>
where
    M: ErrorMatcher,
    H: FnOnce(&StepError) -> T,
{
    type Output = T;

    fn run(self, pipe: &Pipe<T>) -> Pipe<T> {
        pipe.catch(self.matcher, self.handler)
    }
}

/// A step that fails with a fixed error, whatever its input.
///
/// Built by [`crate::values::raise_`]. A pipe already in the error state
/// keeps its own error.
#[derive(Debug, Clone)]
pub struct Raise {
    error: StepError,
}

impl Raise {
    /// Creates a step raising `error`.
    pub const fn new(error: StepError) -> Self {
        Self { error }
    }

    /// Returns the error the step raises.
    pub const fn error(&self) -> &StepError {
        &self.error
    }
}

impl<T> Step<T> for Raise {
    type Output = T;

    fn run(self, pipe: &Pipe<T>) -> Pipe<T> {
        let error = self.error;
        pipe.try_then(move |_: &T| Err::<T, _>(error))
    }
}

impl<T, F, A1, R> Step<T> for (F, A1)
where
    F: FnOnce(&T, A1) -> R,
{
    type Output = R;

    fn run(self, pipe: &Pipe<T>) -> Pipe<R> {
        let (func, a1) = self;
        pipe.then_with(func, a1)
    }
}

impl<T, F, A1, A2, R> Step<T> for (F, A1, A2)
where
    F: FnOnce(&T, A1, A2) -> R,
{
    type Output = R;

    fn run(self, pipe: &Pipe<T>) -> Pipe<R> {
        let (func, a1, a2) = self;
        pipe.then(move |value| func(value, a1, a2))
    }
}

impl<T, F, A1, A2, A3, R> Step<T> for (F, A1, A2, A3)
where
    F: FnOnce(&T, A1, A2, A3) -> R,
{
    type Output = R;

    fn run(self, pipe: &Pipe<T>) -> Pipe<R> {
        let (func, a1, a2, a3) = self;
        pipe.then(move |value| func(value, a1, a2, a3))
    }
}
