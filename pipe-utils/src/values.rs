//! Helpers for single values, shaped to be used directly as pipe steps.
//!
//! Predicates take their argument by reference, like every step does, and
//! the factories return closures over `&T`:
//!
//! ```rust
//! use pipe_utils::prelude::*;
//! use pipe_utils::values::{clamp, is_even};
//!
//! assert!(Pipe::new(4).then(is_even).resolve().unwrap());
//! assert_eq!(Pipe::new(15).then(clamp(0, 10)).resolve().unwrap(), 10);
//! ```

#![allow(clippy::trivially_copy_pass_by_ref)]

use crate::errors::StepError;
use crate::pipe::Raise;
use serde_json::Value;

/// Returns true if `value` is even.
#[must_use]
pub fn is_even(value: &i64) -> bool {
    value.rem_euclid(2) == 0
}

/// Returns true if `value` is odd. Negative numbers count: `-3` is odd.
#[must_use]
pub fn is_odd(value: &i64) -> bool {
    value.rem_euclid(2) == 1
}

/// Returns a predicate testing whether its input is congruent to `a`
/// modulo `n`, that is whether `(input - a) mod n == 0`.
///
/// A modulus of zero degenerates to equality with `a`.
pub fn is_congruent(a: i64, n: i64) -> impl Fn(&i64) -> bool + Clone {
    move |value: &i64| {
        let difference = i128::from(*value) - i128::from(a);
        if n == 0 {
            difference == 0
        } else {
            difference.rem_euclid(i128::from(n)) == 0
        }
    }
}

/// Returns true if `value` is zero or greater.
#[must_use]
pub fn is_non_negative<T: PartialOrd + Default>(value: &T) -> bool {
    *value >= T::default()
}

/// Returns true if `value` is zero or less.
#[must_use]
pub fn is_non_positive<T: PartialOrd + Default>(value: &T) -> bool {
    *value <= T::default()
}

/// Returns a function clamping its input between `lower` and `upper`.
///
/// Equivalent to `max(lower, min(input, upper))`: when the bounds are
/// inverted, `lower` wins.
pub fn clamp<T: PartialOrd + Clone>(lower: T, upper: T) -> impl Fn(&T) -> T + Clone {
    move |value: &T| {
        let capped = if *value > upper { &upper } else { value };
        if *capped < lower {
            lower.clone()
        } else {
            capped.clone()
        }
    }
}

/// Returns a function raising its input to at least `lower`.
pub fn lclamp<T: PartialOrd + Clone>(lower: T) -> impl Fn(&T) -> T + Clone {
    move |value: &T| {
        if *value < lower {
            lower.clone()
        } else {
            value.clone()
        }
    }
}

/// Returns a function capping its input at `upper`.
pub fn rclamp<T: PartialOrd + Clone>(upper: T) -> impl Fn(&T) -> T + Clone {
    move |value: &T| {
        if *value > upper {
            upper.clone()
        } else {
            value.clone()
        }
    }
}

/// Returns true if the option is empty.
#[must_use]
pub const fn is_none<T>(value: &Option<T>) -> bool {
    value.is_none()
}

/// Returns true if the option holds a value.
#[must_use]
pub const fn is_some<T>(value: &Option<T>) -> bool {
    value.is_some()
}

/// Returns true if the value is JSON `null`.
#[must_use]
pub fn is_null(value: &Value) -> bool {
    value.is_null()
}

/// Negates a predicate.
pub fn not_<T: ?Sized, P>(predicate: P) -> impl Fn(&T) -> bool
where
    P: Fn(&T) -> bool,
{
    move |value: &T| !predicate(value)
}

/// Combines two predicates; the second only runs if the first holds.
pub fn and_<T: ?Sized, P, Q>(first: P, second: Q) -> impl Fn(&T) -> bool
where
    P: Fn(&T) -> bool,
    Q: Fn(&T) -> bool,
{
    move |value: &T| first(value) && second(value)
}

/// Combines two predicates; the second only runs if the first fails.
pub fn or_<T: ?Sized, P, Q>(first: P, second: Q) -> impl Fn(&T) -> bool
where
    P: Fn(&T) -> bool,
    Q: Fn(&T) -> bool,
{
    move |value: &T| first(value) || second(value)
}

/// Returns a step that fails with `error`, raised from `cause` when one is
/// given.
///
/// ```rust
/// use pipe_utils::prelude::*;
/// use pipe_utils::values::raise_;
///
/// let cause = StepError::msg("disk full");
/// let pipe = Pipe::new(1) | raise_(StepError::msg("could not save"), Some(cause));
/// let error = pipe.error().unwrap();
/// assert_eq!(error.originating_error().unwrap().to_string(), "disk full");
/// ```
#[must_use]
pub fn raise_(error: StepError, cause: Option<StepError>) -> Raise {
    Raise::new(match cause {
        Some(cause) => error.caused_by(cause),
        None => error,
    })
}
