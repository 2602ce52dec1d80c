//! Testing utilities for pipelines.
//!
//! This module provides:
//! - [`CallCounter`], an observable side effect for proving that steps did
//!   or did not run
//! - assertions over pipe states
//! - [`init_tracing`], a log subscriber for tests

use crate::errors::{ExprError, ExprErrorKind};
use crate::pipe::Pipe;
use std::error::Error as StdError;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Counts how many times the steps it hands out were invoked.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    count: Arc<AtomicUsize>,
}

impl CallCounter {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of recorded calls.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Records one call.
    pub fn record(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Resets the count to zero.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    /// Returns a step that records a call and passes its input through.
    pub fn tap<T: Clone>(&self) -> impl Fn(&T) -> T + Clone {
        let counter = self.clone();
        move |value: &T| {
            counter.record();
            value.clone()
        }
    }
}

/// Asserts that the pipe holds `expected`.
pub fn assert_resolves_to<T: PartialEq + Debug>(pipe: &Pipe<T>, expected: &T) {
    match pipe.as_result() {
        Ok(value) => assert_eq!(value, expected, "pipe resolved to an unexpected value"),
        Err(error) => panic!("Expected value {expected:?}, got error: {error}"),
    }
}

/// Asserts that the pipe failed with an error of type `E`.
pub fn assert_failed_with<E: StdError + 'static, T: Debug>(pipe: &Pipe<T>) {
    match pipe.as_result() {
        Ok(value) => panic!(
            "Expected failure with {}, got value: {value:?}",
            std::any::type_name::<E>()
        ),
        Err(error) => assert!(
            error.is::<E>(),
            "Expected error of type {}, got: {error}",
            std::any::type_name::<E>()
        ),
    }
}

/// Asserts that the pipe failed with an [`ExprError`] of the given kind.
pub fn assert_expr_error<T: Debug>(pipe: &Pipe<T>, kind: ExprErrorKind) {
    let error = pipe
        .error()
        .unwrap_or_else(|| panic!("Expected {kind} error, got {pipe:?}"));
    let expr_error = error
        .downcast_ref::<ExprError>()
        .unwrap_or_else(|| panic!("Expected expression error, got: {error}"));
    assert_eq!(expr_error.kind(), kind, "unexpected error: {expr_error}");
}

/// Installs a test log subscriber honoring `RUST_LOG` (default `warn`).
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
