use super::*;
use crate::errors::{ExprError, ExprErrorKind};
use crate::testing::{assert_failed_with, assert_resolves_to, init_tracing, CallCounter};
use pretty_assertions::assert_eq;
use std::num::ParseIntError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("division by zero")]
struct DivideByZero;

#[derive(Debug, Error)]
#[error("{0}")]
struct Oops(&'static str);

#[allow(clippy::ptr_arg)]
fn reciprocals(values: &Vec<i32>) -> Result<Vec<f64>, DivideByZero> {
    values
        .iter()
        .map(|&x| if x == 0 { Err(DivideByZero) } else { Ok(1.0 / f64::from(x)) })
        .collect()
}

fn failing_pipe() -> Pipe<Vec<f64>> {
    Pipe::new(vec![-1, 0, 1]).try_then(reciprocals)
}

#[test]
fn test_pipe_yields_data() {
    assert_eq!(Pipe::new(5).resolve().unwrap(), 5);
    assert_eq!(Pipe::new(vec![1, 2, 3]).resolve_or(vec![2, 4, 8]).unwrap(), vec![1, 2, 3]);
    assert_eq!(
        Pipe::new("Hello").resolve_or_raise(Oops("unused")).unwrap(),
        "Hello"
    );
}

#[test]
fn test_then_converts_value() {
    assert_eq!(Pipe::new(5).then(ToString::to_string).resolve().unwrap(), "5");
    assert_eq!(Pipe::new("Hello").then(|s: &&str| s.len()).resolve_or(0).unwrap(), 5);

    let sorted = Pipe::new(vec![3, 2, 1]).then(|v: &Vec<i32>| {
        let mut v = v.clone();
        v.sort_unstable();
        v
    });
    assert_resolves_to(&sorted, &vec![1, 2, 3]);
}

#[test]
fn test_pipe_is_immutable() {
    let p1 = Pipe::new("Hello");
    let p2 = p1.then(|s: &&str| s.len());

    assert_eq!(p1.value(), Some(&"Hello"));
    assert_eq!(p2.value(), Some(&5));
    assert_eq!(p1.resolve().unwrap(), "Hello");
}

#[test]
fn test_branching_from_shared_state() {
    let base = Pipe::new(10);
    let doubled = base.then(|n: &i32| n * 2);
    let halved = base.then(|n: &i32| n / 2);

    assert_resolves_to(&doubled, &20);
    assert_resolves_to(&halved, &5);
    assert_resolves_to(&base, &10);
}

#[test]
fn test_bitor_operator() {
    assert_eq!((Pipe::new("Hello") | |s: &&str| s.len()).resolve().unwrap(), 5);
    assert_eq!((Pipe::new(5) | |n: &i32| n.to_string()).resolve().unwrap(), "5");

    let doubled = Pipe::new("Hello")
        | (|s: &&str| s.chars().collect::<Vec<_>>())
        | (|chars: &Vec<char>| chars.iter().flat_map(|&c| [c, c]).collect::<Vec<_>>())
        | (|chars: &Vec<char>| chars.iter().collect::<String>());
    assert_eq!(doubled.resolve().unwrap(), "HHeelllloo");
}

#[test]
fn test_bitor_on_reference_keeps_pipe() {
    let base = Pipe::new(3);
    let squared = &base | |n: &i32| n * n;
    assert_resolves_to(&squared, &9);
    assert_resolves_to(&base, &3);
}

#[test]
fn test_apply_matches_operator() {
    let by_method = Pipe::new(4).apply(|n: &i32| n + 1);
    let by_operator = Pipe::new(4) | |n: &i32| n + 1;
    assert_eq!(by_method.value(), by_operator.value());
}

#[test]
fn test_error_is_captured_and_deferred() {
    init_tracing();
    let pipe = failing_pipe().then(|v: &Vec<f64>| v.len());

    assert!(pipe.is_err());
    assert_failed_with::<DivideByZero, _>(&pipe);
    assert_eq!(pipe.clone().resolve_or(0).unwrap(), 0);

    let err = pipe.clone().resolve().unwrap_err();
    assert!(err.is::<DivideByZero>());

    let raised = pipe.resolve_or_raise(Oops("Oops!!")).unwrap_err();
    assert!(raised.to_string().contains("Oops!!"));
    assert!(raised.is::<Oops>());
}

#[test]
fn test_failed_pipe_skips_later_steps() {
    let counter = CallCounter::new();
    let pipe = failing_pipe()
        .then(counter.tap::<Vec<f64>>())
        .then(counter.tap::<Vec<f64>>())
        | counter.tap::<Vec<f64>>();

    assert!(pipe.is_err());
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_later_steps_share_captured_error() {
    let failed = failing_pipe();
    let later = failed
        .then(|v: &Vec<f64>| v.len())
        .then(|n: &usize| n + 1)
        .try_then(|n: &usize| i32::try_from(*n));

    let original = failed.error().unwrap();
    assert!(later.error().unwrap().ptr_eq(original));
    assert!(later.resolve().unwrap_err().ptr_eq(original));
}

#[test]
fn test_catch_recovers_matching_error() {
    let recovered = failing_pipe()
        .then(|v: &Vec<f64>| v.iter().map(|x| *x as i64).collect::<Vec<_>>())
        .catch(kind::<DivideByZero>(), |_| vec![0]);
    assert_eq!(recovered.resolve().unwrap(), vec![0]);
}

#[test]
fn test_catch_passes_unmatched_error_through() {
    let pipe = failing_pipe().catch(kind::<ParseIntError>(), |_| vec![0.0]);
    assert!(pipe.is_err());
    assert!(pipe.resolve().unwrap_err().is::<DivideByZero>());
}

#[test]
fn test_catch_on_success_is_noop() {
    let counter = CallCounter::new();
    let pipe = Pipe::new(1).catch(AnyError, |_| {
        counter.record();
        2
    });
    assert_resolves_to(&pipe, &1);
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_caught_pipe_continues() {
    let pipe = Pipe::new("x")
        .try_then(|s: &&str| s.parse::<i32>())
        .catch(kind::<ParseIntError>(), |_| 7)
        .then(|n: &i32| n * 3);
    assert_resolves_to(&pipe, &21);
}

#[test]
fn test_catch_with_set_of_kinds() {
    let pipe = failing_pipe().catch(
        (kind::<ParseIntError>(), kind::<DivideByZero>()),
        |_| vec![1.0],
    );
    assert_resolves_to(&pipe, &vec![1.0]);
}

#[test]
fn test_catch_handler_sees_error() {
    let pipe = Pipe::new("abc")
        .try_then(|s: &&str| s.parse::<i32>())
        .then(|n: &i32| n.to_string())
        .catch(AnyError, |err| format!("failed: {err}"));
    assert!(pipe.resolve().unwrap().starts_with("failed: "));
}

#[test]
fn test_resolve_or_catching_only_covers_matching_errors() {
    let covered = failing_pipe().resolve_or_catching(vec![], kind::<DivideByZero>());
    assert_eq!(covered.unwrap(), Vec::<f64>::new());

    let uncovered = failing_pipe().resolve_or_catching(vec![], kind::<ParseIntError>());
    assert!(uncovered.unwrap_err().is::<DivideByZero>());
}

#[test]
fn test_resolve_or_raise_chains_captured_error() {
    let failed = failing_pipe();
    let captured = failed.error().unwrap().clone();

    let raised = failed.resolve_or_raise(Oops("could not invert")).unwrap_err();
    assert!(raised.is::<Oops>());
    assert!(raised.originating_error().unwrap().ptr_eq(&captured));
    assert!(std::error::Error::source(&raised).is_some());
}

#[test]
fn test_resolve_or_raise_unchained() {
    let policy = RaisePolicy::new().with_chained(false);
    let raised = failing_pipe()
        .resolve_or_raise_with(Oops("plain"), policy)
        .unwrap_err();
    assert!(raised.is::<Oops>());
    assert!(raised.originating_error().is_none());
}

#[test]
fn test_resolve_or_raise_with_unmatched_policy_returns_captured() {
    let failed = failing_pipe();
    let captured = failed.error().unwrap().clone();

    let policy = RaisePolicy::new().with_catch(kind::<ParseIntError>());
    let err = failed.resolve_or_raise_with(Oops("never"), policy).unwrap_err();
    assert!(err.ptr_eq(&captured));
}

#[test]
fn test_then_descriptor_carries_args() {
    let pipe = Pipe::new("Hello") | Then::new(|s: &&str, suffix: &str| format!("{s}{suffix}"), ", World");
    assert_resolves_to(&pipe, &"Hello, World".to_string());

    let pipe = Pipe::new("one")
        | Then::new(
            |s: &&str, (two, end): (&str, &str)| format!("{s}-{two}{end}"),
            ("two", "-three"),
        );
    assert_resolves_to(&pipe, &"one-two-three".to_string());
}

#[test]
fn test_try_then_descriptor_captures_error() {
    let parse_radix = |s: &&str, radix: u32| i64::from_str_radix(s, radix);

    let ok = Pipe::new("ff") | TryThen::new(parse_radix, 16);
    assert_resolves_to(&ok, &255);

    let bad = Pipe::new("zz") | TryThen::new(parse_radix, 16);
    assert_failed_with::<ParseIntError, _>(&bad);
}

#[test]
fn test_tuple_steps() {
    let pipe = Pipe::new(2) | (|n: &i32, k: i32| n * k, 5);
    assert_resolves_to(&pipe, &10);

    let pipe = Pipe::new(2) | (|n: &i32, a: i32, b: i32| n * a + b, 5, 1);
    assert_resolves_to(&pipe, &11);

    let pipe = Pipe::new(2) | (|n: &i32, a: i32, b: i32, c: i32| n + a + b + c, 1, 2, 3);
    assert_resolves_to(&pipe, &8);
}

#[test]
fn test_fallible_step() {
    let pipe = Pipe::new("12") | fallible(|s: &&str| s.parse::<u8>());
    assert_resolves_to(&pipe, &12);

    let pipe = Pipe::new("300") | fallible(|s: &&str| s.parse::<u8>());
    assert_failed_with::<ParseIntError, _>(&pipe);
}

#[test]
fn test_catch_step() {
    let pipe = failing_pipe() | Catch::new(kind::<DivideByZero>(), |_: &StepError| vec![0.0]);
    assert_resolves_to(&pipe, &vec![0.0]);
}

#[test]
fn test_catch_by_expr_error_kind() {
    let pipe = Pipe::<i32>::from_error(StepError::new(ExprError::zero_division("%")))
        .catch(ExprErrorKind::ZeroDivision, |_| 0)
        .then(|n: &i32| n + 1);
    assert_resolves_to(&pipe, &1);
}

#[test]
fn test_from_result() {
    assert_resolves_to(&Pipe::from_result("7".parse::<i32>()), &7);
    assert_failed_with::<ParseIntError, _>(&Pipe::from_result("q".parse::<i32>()));
}

#[test]
fn test_step_returning_captured_error_keeps_identity() {
    let original = StepError::msg("first failure");
    let forwarded = original.clone();
    let pipe = Pipe::new(1).try_then(move |_: &i32| Err::<i32, _>(forwarded));
    assert!(pipe.error().unwrap().ptr_eq(&original));
}

#[test]
fn test_debug_shows_state() {
    assert_eq!(format!("{:?}", Pipe::new(3)), "Pipe::Success(3)");
    let failed = Pipe::<i32>::from_error(StepError::msg("nope"));
    assert!(format!("{failed:?}").starts_with("Pipe::Error("));
}

#[test]
fn test_scenario_stringify() {
    assert_eq!(Pipe::new(5).then(ToString::to_string).resolve().unwrap(), "5");
}

#[test]
fn test_scenario_default_on_failure() {
    let pipe = Pipe::new(vec![-1, 0, 1])
        .try_then(reciprocals)
        .then(|v: &Vec<f64>| v.iter().map(|x| *x as i64).collect::<Vec<_>>());
    assert_eq!(pipe.resolve_or(vec![-1]).unwrap(), vec![-1]);
}
