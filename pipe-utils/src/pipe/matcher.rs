//! Error matchers for `catch` and the terminal methods.
//!
//! A matcher decides whether a captured [`StepError`] is one the caller
//! expected. Matchers compose into sets: a tuple, `Vec` or array of matchers
//! matches when any member does.

use crate::errors::{ExprError, ExprErrorKind, StepError};
use std::error::Error as StdError;
use std::fmt;
use std::marker::PhantomData;

/// Decides whether a captured error should be handled.
pub trait ErrorMatcher {
    /// Returns true if `error` matches.
    fn matches(&self, error: &StepError) -> bool;
}

/// Matches every error.
///
/// This is the default matcher of [`crate::pipe::Pipe::resolve_or`] and
/// [`crate::pipe::RaisePolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnyError;

impl ErrorMatcher for AnyError {
    fn matches(&self, _error: &StepError) -> bool {
        true
    }
}

/// Matches errors of type `E`.
pub struct Kind<E>(PhantomData<fn() -> E>);

impl<E> Kind<E> {
    /// Creates a matcher for `E`.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> Default for Kind<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Kind<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Kind<E> {}

impl<E> fmt::Debug for Kind<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind<{}>", std::any::type_name::<E>())
    }
}

impl<E: StdError + 'static> ErrorMatcher for Kind<E> {
    fn matches(&self, error: &StepError) -> bool {
        error.is::<E>()
    }
}

/// Shorthand for [`Kind::new`].
#[must_use]
pub const fn kind<E: StdError + 'static>() -> Kind<E> {
    Kind::new()
}

impl ErrorMatcher for ExprErrorKind {
    fn matches(&self, error: &StepError) -> bool {
        error
            .downcast_ref::<ExprError>()
            .is_some_and(|expr_error| expr_error.kind() == *self)
    }
}

/// Matches errors accepted by a predicate.
#[derive(Clone, Copy)]
pub struct Predicate<F>(F);

impl<F> fmt::Debug for Predicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}

impl<F: Fn(&StepError) -> bool> ErrorMatcher for Predicate<F> {
    fn matches(&self, error: &StepError) -> bool {
        (self.0)(error)
    }
}

/// Builds a matcher from a predicate.
pub const fn matching<F: Fn(&StepError) -> bool>(predicate: F) -> Predicate<F> {
    Predicate(predicate)
}

impl<M: ErrorMatcher + ?Sized> ErrorMatcher for &M {
    fn matches(&self, error: &StepError) -> bool {
        (**self).matches(error)
    }
}

impl<M: ErrorMatcher + ?Sized> ErrorMatcher for Box<M> {
    fn matches(&self, error: &StepError) -> bool {
        (**self).matches(error)
    }
}

impl<M: ErrorMatcher> ErrorMatcher for [M] {
    fn matches(&self, error: &StepError) -> bool {
        self.iter().any(|matcher| matcher.matches(error))
    }
}

impl<M: ErrorMatcher, const N: usize> ErrorMatcher for [M; N] {
    fn matches(&self, error: &StepError) -> bool {
        self.as_slice().matches(error)
    }
}

impl<M: ErrorMatcher> ErrorMatcher for Vec<M> {
    fn matches(&self, error: &StepError) -> bool {
        self.as_slice().matches(error)
    }
}

macro_rules! impl_matcher_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: ErrorMatcher),+> ErrorMatcher for ($($name,)+) {
            fn matches(&self, error: &StepError) -> bool {
                $(self.$idx.matches(error))||+
            }
        }
    };
}

impl_matcher_tuple!(A 0);
impl_matcher_tuple!(A 0, B 1);
impl_matcher_tuple!(A 0, B 1, C 2);
impl_matcher_tuple!(A 0, B 1, C 2, D 3);

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::ParseIntError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("timed out")]
    struct Timeout;

    fn parse_error() -> StepError {
        StepError::new("x".parse::<i32>().unwrap_err())
    }

    #[test]
    fn test_any_error_matches_everything() {
        assert!(AnyError.matches(&parse_error()));
        assert!(AnyError.matches(&StepError::msg("anything")));
    }

    #[test]
    fn test_kind_matches_by_type() {
        assert!(kind::<ParseIntError>().matches(&parse_error()));
        assert!(!kind::<Timeout>().matches(&parse_error()));
        assert!(Kind::<Timeout>::new().matches(&StepError::new(Timeout)));
    }

    #[test]
    fn test_expr_error_kind_matches() {
        let err = StepError::new(ExprError::zero_division("/"));
        assert!(ExprErrorKind::ZeroDivision.matches(&err));
        assert!(!ExprErrorKind::Type.matches(&err));
        assert!(!ExprErrorKind::ZeroDivision.matches(&parse_error()));
    }

    #[test]
    fn test_sets_match_any_member() {
        let err = StepError::new(Timeout);
        assert!((kind::<ParseIntError>(), kind::<Timeout>()).matches(&err));
        assert!(!(kind::<ParseIntError>(),).matches(&err));
        assert!(vec![ExprErrorKind::Key, ExprErrorKind::Index]
            .matches(&StepError::new(ExprError::MissingKey { key: "k".to_string() })));
        assert!(![ExprErrorKind::Key, ExprErrorKind::Index].matches(&err));
    }

    #[test]
    fn test_predicate_matcher() {
        let matcher = matching(|err: &StepError| err.to_string().contains("timed"));
        assert!(matcher.matches(&StepError::new(Timeout)));
        assert!(!matcher.matches(&parse_error()));
    }

    #[test]
    fn test_boxed_and_borrowed_matchers() {
        let boxed: Box<dyn ErrorMatcher> = Box::new(kind::<Timeout>());
        assert!(boxed.matches(&StepError::new(Timeout)));
        assert!((&AnyError).matches(&parse_error()));
    }
}
