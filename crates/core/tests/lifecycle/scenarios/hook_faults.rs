//! Runs where hooks return faults.

use std::sync::Arc;

use caseflow_core::fault::AGGREGATE_FAULT_TYPE;
use caseflow_core::{
    ExecutionContext, ExplicitOption, FaultAggregator, RecordingEventBus, RunSummary,
    TestCaseRunner, run_lifecycle,
};
use tokio_util::sync::CancellationToken;

use crate::helpers::assertions::*;
use crate::helpers::cases::*;
use crate::helpers::scripted_runner::*;

/// A Starting fault becomes Execute's pre-fault and is not reported again.
#[tokio::test]
async fn test_lifecycle_starting_fault_is_passed_to_execute() {
    // Given: Starting publishes, then fails with divide by zero
    let runner =
        ScriptedRunner::passing().on_starting(HookBehavior::PublishThenFail(divide_by_zero()));
    let bus = Arc::new(RecordingEventBus::new());
    let token = CancellationToken::new();

    // When: Running the test case
    let summary = runner
        .run(
            sample_case("case-1"),
            bus.clone(),
            ExplicitOption::Off,
            token.clone(),
        )
        .await;

    // Then: Execute ran once with the fault, and no CleanupFailure was published
    assert_eq!(runner.execute_calls(), vec![Some(divide_by_zero())]);
    assert_event_types(&bus, &["test_case_starting", "test_case_finished"]);
    assert_zero_finished(&bus.events()[1]);
    assert!(summary.is_empty());
    assert!(!token.is_cancelled());
    assert!(runner.cleanup_faults().is_empty());
}

/// A Finished fault is reported through the cleanup failure hook.
#[tokio::test]
async fn test_lifecycle_finished_fault_is_reported_as_cleanup_failure() {
    // Given: Finished publishes, then fails with divide by zero
    let runner =
        ScriptedRunner::passing().on_finished(HookBehavior::PublishThenFail(divide_by_zero()));
    let bus = Arc::new(RecordingEventBus::new());
    let token = CancellationToken::new();

    // When: Running the test case
    runner
        .run(
            sample_case("case-2"),
            bus.clone(),
            ExplicitOption::Off,
            token.clone(),
        )
        .await;

    // Then: Starting, Finished(zero), CleanupFailure with the flattened fault
    assert_event_types(
        &bus,
        &[
            "test_case_starting",
            "test_case_finished",
            "test_case_cleanup_failure",
        ],
    );
    let events = bus.events();
    assert_zero_finished(&events[1]);

    let failure = events[2].as_cleanup_failure().expect("cleanup failure");
    assert_eq!(failure.fault.exception_types.len(), 1);
    assert!(failure.fault.exception_types[0].contains("DivideByZero"));
    assert_eq!(failure.fault.messages, vec!["Attempted to divide by zero."]);
    assert_eq!(failure.fault.exception_parent_indices, vec![-1]);
    assert!(!token.is_cancelled());
}

/// A fault from the cleanup failure hook is published as an error event.
#[tokio::test]
async fn test_lifecycle_cleanup_hook_fault_becomes_error_event() {
    // Given: Finished fails with A, the cleanup failure hook fails with B
    let fault_a = divide_by_zero();
    let fault_b = fixture_setup_failure();
    let runner = ScriptedRunner::passing()
        .on_finished(HookBehavior::PublishThenFail(fault_a.clone()))
        .on_cleanup_failure(HookBehavior::Fail(fault_b.clone()));
    let bus = Arc::new(RecordingEventBus::new());
    let token = CancellationToken::new();

    // When: Running the test case
    let summary = runner
        .run(
            sample_case("case-3"),
            bus.clone(),
            ExplicitOption::Off,
            token.clone(),
        )
        .await;

    // Then: The hook saw A, the error event carries B, nothing propagated
    assert_eq!(runner.cleanup_faults(), vec![fault_a]);
    assert_event_types(&bus, &["test_case_starting", "test_case_finished", "error"]);

    let events = bus.events();
    let error = events[2].as_error().expect("error event");
    assert_eq!(error.fault, fault_b.flatten());
    assert!(error.fault.exception_types[0].ends_with("FixtureSetupError"));
    assert_eq!(error.fault.exception_parent_indices, vec![-1, 0]);

    assert!(summary.is_empty());
    assert!(!token.is_cancelled(), "cleanup hook faults never cancel");
}

/// A hook fault does not stop later stages from running.
#[tokio::test]
async fn test_lifecycle_hook_fault_does_not_abort_run() {
    // Given: Starting fails without publishing
    let runner = ScriptedRunner::returning(RunSummary::new(1, 1, 0, 0, 0.1))
        .on_starting(HookBehavior::Fail(divide_by_zero()));
    let bus = Arc::new(RecordingEventBus::new());

    // When: Running the test case
    let summary = runner
        .run(
            sample_case("case-4"),
            bus.clone(),
            ExplicitOption::Off,
            CancellationToken::new(),
        )
        .await;

    // Then: Execute and Finished still ran
    assert_eq!(summary, RunSummary::new(1, 1, 0, 0, 0.1));
    assert_eq!(runner.execute_calls().len(), 1);
    assert_event_types(&bus, &["test_case_finished"]);
}

/// Faults pending after Finished are combined in capture order.
#[tokio::test]
async fn test_lifecycle_multiple_faults_form_composite_in_capture_order() {
    // Given: Execute captures a fixture fault and Finished fails with divide by zero
    let runner = ScriptedRunner::passing()
        .capturing_in_execute(fixture_setup_failure())
        .on_finished(HookBehavior::PublishThenFail(divide_by_zero()));
    let bus = Arc::new(RecordingEventBus::new());

    // When: Running the test case
    runner
        .run(
            sample_case("case-5"),
            bus.clone(),
            ExplicitOption::Off,
            CancellationToken::new(),
        )
        .await;

    // Then: The hook received one aggregate with both faults in order
    let cleanup = runner.cleanup_faults();
    assert_eq!(cleanup.len(), 1);
    assert_eq!(cleanup[0].type_name(), AGGREGATE_FAULT_TYPE);
    assert_eq!(
        cleanup[0].children(),
        &[fixture_setup_failure(), divide_by_zero()]
    );

    // And: The flattened record links children to the aggregate root
    let events = bus.events();
    let failure = events[2].as_cleanup_failure().expect("cleanup failure");
    assert_eq!(failure.fault.exception_types[0], AGGREGATE_FAULT_TYPE);
    assert_eq!(failure.fault.messages[0], "One or more errors occurred.");
    assert_eq!(failure.fault.exception_parent_indices, vec![-1, 0, 1, 0]);
    assert_eq!(failure.fault.stack_traces.len(), 4);
}

/// Faults already in a handed-over aggregator reach Execute like Starting faults.
#[tokio::test]
async fn test_lifecycle_handed_over_aggregator_feeds_execute() {
    // Given: An aggregator that already holds a setup fault
    let aggregator = FaultAggregator::new();
    aggregator.capture(fixture_setup_failure());
    let runner = ScriptedRunner::passing();
    let bus = Arc::new(RecordingEventBus::new());
    let ctx = ExecutionContext::with_aggregator(
        sample_case("case-seeded"),
        ExplicitOption::Off,
        bus.clone(),
        aggregator,
        CancellationToken::new(),
    );

    // When: Running the lifecycle on that context
    run_lifecycle(&runner, ctx).await;

    // Then: Execute received the fault and nothing was left for cleanup
    assert_eq!(runner.execute_calls(), vec![Some(fixture_setup_failure())]);
    assert_event_types(&bus, &["test_case_starting", "test_case_finished"]);
    assert!(runner.cleanup_faults().is_empty());
}
