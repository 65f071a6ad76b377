//! Runs where no hook fails and nothing is cancelled.

use std::sync::Arc;

use caseflow_core::{
    EngineStatus, ExplicitOption, RecordingEventBus, RunSummary, TestCaseRunner,
};
use tokio_util::sync::CancellationToken;

use crate::helpers::assertions::*;
use crate::helpers::cases::*;
use crate::helpers::scripted_runner::*;

/// Execute's summary is published in Finished and returned unchanged.
#[tokio::test]
async fn test_lifecycle_summary_flows_into_finished_event() {
    // Given: Execute reports 9 total, 2 failed, 1 skipped, 3 not run in 21.12s
    let expected = RunSummary::new(9, 2, 1, 3, 21.12);
    let runner = ScriptedRunner::returning(expected);
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

    // Then: Starting then Finished, carrying Execute's numbers
    assert_eq!(summary, expected);
    assert_event_types(&bus, &["test_case_starting", "test_case_finished"]);

    let events = bus.events();
    let finished = events[1].as_finished().expect("finished event");
    assert_eq!(finished.execution_time, 21.12);
    assert_eq!(finished.tests_failed, 2);
    assert_eq!(finished.tests_not_run, 3);
    assert_eq!(finished.tests_skipped, 1);
    assert_eq!(finished.tests_total, 9);
    assert!(!token.is_cancelled());
}

/// Starting carries the test case metadata verbatim.
#[tokio::test]
async fn test_lifecycle_starting_event_copies_metadata() {
    // Given: A fully described test case
    let case = sample_case("case-2");
    let bus = Arc::new(RecordingEventBus::new());

    // When: Running it with default hooks
    ScriptedRunner::passing()
        .run(
            case.clone(),
            bus.clone(),
            ExplicitOption::On,
            CancellationToken::new(),
        )
        .await;

    // Then: Every metadata field is copied
    let events = bus.events();
    let starting = events[0].as_starting().expect("starting event");
    assert_eq!(starting.test_case_display_name, case.display_name);
    assert_eq!(starting.test_class_name.as_deref(), Some("Demo.Arithmetic.Calculator"));
    assert_eq!(starting.test_class_namespace.as_deref(), Some("Demo.Arithmetic"));
    assert_eq!(starting.test_class_simple_name.as_deref(), Some("Calculator"));
    assert_eq!(starting.test_method_name.as_deref(), Some("Divide"));
    assert_eq!(starting.source_file_path.as_deref(), Some("tests/calculator.rs"));
    assert_eq!(starting.source_line_number, Some(42));
    assert_eq!(starting.traits["category"], vec!["arithmetic", "fast"]);
    assert!(!starting.explicit);
    assert_eq!(starting.skip_reason, None);
}

/// All events of one run share the test case identity.
#[tokio::test]
async fn test_lifecycle_identity_is_identical_across_events() {
    // Given: A run that produces Starting, Finished and CleanupFailure
    let case = sample_case("case-3");
    let bus = Arc::new(RecordingEventBus::new());
    let runner =
        ScriptedRunner::passing().on_finished(HookBehavior::PublishThenFail(divide_by_zero()));

    // When: Running the test case
    runner
        .run(
            case.clone(),
            bus.clone(),
            ExplicitOption::Off,
            CancellationToken::new(),
        )
        .await;

    // Then: Every event carries the same identifiers
    let events = bus.events();
    assert_eq!(events.len(), 3);
    assert_identity_everywhere(&events, &case.identity);
}

/// Hooks and Execute observe the phase they run in.
#[tokio::test]
async fn test_lifecycle_status_progresses_through_phases() {
    // Given: A runner that records the status at each call
    let runner = ScriptedRunner::passing();

    // When: Running a test case
    runner
        .run(
            sample_case("case-4"),
            Arc::new(RecordingEventBus::new()),
            ExplicitOption::Off,
            CancellationToken::new(),
        )
        .await;

    // Then: Initializing, Running, CleaningUp in order
    assert_eq!(
        runner.observed(),
        vec![
            Observed::Starting(EngineStatus::Initializing),
            Observed::Execute {
                status: EngineStatus::Running,
                pre_fault: None,
            },
            Observed::Finished {
                status: EngineStatus::CleaningUp,
                summary: RunSummary::default(),
            },
        ]
    );
}

/// The same runner drives several test cases one after another.
#[tokio::test]
async fn test_lifecycle_runner_is_reusable() {
    // Given: One runner and one shared bus
    let runner = ScriptedRunner::returning(RunSummary::new(1, 0, 0, 0, 0.5));
    let bus = Arc::new(RecordingEventBus::new());
    let mut total = RunSummary::default();

    // When: Running three test cases in sequence
    for id in ["a", "b", "c"] {
        total += runner
            .run(
                sample_case(id),
                bus.clone(),
                ExplicitOption::Off,
                CancellationToken::new(),
            )
            .await;
    }

    // Then: Each run published its own pair of events
    assert_eq!(total, RunSummary::new(3, 0, 0, 0, 1.5));
    assert_eq!(bus.len(), 6);
    assert_eq!(runner.execute_calls(), vec![None, None, None]);
}

/// A hand-built summary with negative time is clamped before it is published.
#[tokio::test]
async fn test_lifecycle_negative_time_is_clamped() {
    // Given: Execute builds its summary field by field with a negative time
    let runner = ScriptedRunner::returning(RunSummary {
        total: 1,
        failed: 0,
        skipped: 0,
        not_run: 0,
        time: -3.5,
    });
    let bus = Arc::new(RecordingEventBus::new());

    // When: Running the test case
    let summary = runner
        .run(
            sample_case("case-negative"),
            bus.clone(),
            ExplicitOption::Off,
            CancellationToken::new(),
        )
        .await;

    // Then: Neither the returned summary nor the Finished event is negative
    assert_eq!(summary, RunSummary::new(1, 0, 0, 0, 0.0));
    let events = bus.events();
    let finished = events[1].as_finished().expect("finished event");
    assert_eq!(finished.execution_time, 0.0);
    assert_eq!(finished.tests_total, 1);
}

/// An explicit test case is not run unless the explicit mode allows it.
#[tokio::test]
async fn test_lifecycle_explicit_mode_decides_execution() {
    // Given: An explicit test case
    let case = Arc::new(
        (*sample_case("case-explicit"))
            .clone()
            .with_explicit(true),
    );
    let runner = ScriptedRunner::returning(RunSummary::new(1, 0, 0, 0, 0.5));

    for (mode, expected) in [
        (ExplicitOption::Off, RunSummary::new(1, 0, 0, 1, 0.0)),
        (ExplicitOption::On, RunSummary::new(1, 0, 0, 0, 0.5)),
        (ExplicitOption::Only, RunSummary::new(1, 0, 0, 0, 0.5)),
    ] {
        let bus = Arc::new(RecordingEventBus::new());

        // When: Running it under each mode
        let summary = runner
            .run(case.clone(), bus.clone(), mode, CancellationToken::new())
            .await;

        // Then: Off reports it as not run, the other modes execute it
        assert_eq!(summary, expected, "mode {mode}");
        let events = bus.events();
        assert!(events[0].as_starting().expect("starting event").explicit);
        assert_eq!(
            events[1].as_finished().expect("finished event").summary(),
            expected
        );
    }
}
