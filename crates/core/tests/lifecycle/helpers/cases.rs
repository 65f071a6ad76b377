//! Test case and fault factories.

use std::sync::{Arc, LazyLock};

use caseflow_core::{Fault, TestCaseDescriptor, TestCaseIdentity};

/// Error with the same message the runtime uses for integer division by zero.
#[derive(Debug, thiserror::Error)]
#[error("Attempted to divide by zero.")]
pub struct DivideByZeroError;

/// Error wrapping a lower-level cause, for nested fault trees.
#[derive(Debug, thiserror::Error)]
#[error("fixture setup failed")]
pub struct FixtureSetupError {
    #[source]
    pub source: std::num::ParseIntError,
}

/// A fully described test case.
#[allow(dead_code)]
pub fn sample_case(case_id: &str) -> Arc<TestCaseDescriptor> {
    Arc::new(
        TestCaseDescriptor::new(
            TestCaseIdentity::new("assembly-1", "collection-1", "class-1", "method-1", case_id),
            "Calculator.Divide(x: 1, y: 0)",
        )
        .with_class("Demo.Arithmetic.Calculator")
        .with_method("Divide")
        .with_source("tests/calculator.rs", 42)
        .with_trait("category", "arithmetic")
        .with_trait("category", "fast"),
    )
}

// Converted once so that repeated calls compare equal even when a backtrace is captured.
static DIVIDE_BY_ZERO: LazyLock<Fault> = LazyLock::new(|| Fault::from(DivideByZeroError));

static FIXTURE_SETUP_FAILURE: LazyLock<Fault> = LazyLock::new(|| {
    let source = "not-a-number"
        .parse::<i32>()
        .expect_err("input is not a number");
    Fault::from(FixtureSetupError { source })
});

/// Fault converted from [`DivideByZeroError`].
#[allow(dead_code)]
pub fn divide_by_zero() -> Fault {
    DIVIDE_BY_ZERO.clone()
}

/// Fault with one nested cause.
#[allow(dead_code)]
pub fn fixture_setup_failure() -> Fault {
    FIXTURE_SETUP_FAILURE.clone()
}
