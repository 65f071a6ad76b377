//! 러너 — 테스트 케이스 하나의 생명주기를 구동합니다.
//!
//! [`TestCaseRunner`]는 실행 단계(`run_test_case`)만 필수로 구현하고,
//! 나머지 훅은 기본 구현(이벤트 발행)을 그대로 쓰거나 개별적으로 재정의합니다.
//! 러너는 실행별 상태를 갖지 않으며, 모든 상태는
//! [`ExecutionContext`]에 있습니다.
//!
//! # 생명주기
//! ```text
//! Starting (보호됨) → Execute (취소 시 건너뜀) → Finished (보호됨)
//!     → 정리 실패 보고 (집계기가 비어 있지 않을 때) → RunSummary
//! ```
//!
//! 취소는 중단이 아니라 요청입니다. 취소되어도 Execute만 건너뛰고
//! 이후 단계는 모두 실행됩니다. 훅의 폴트는 호출자에게 전파되지 않습니다.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::bus::EventBus;
use crate::context::{EngineStatus, ExecutionContext, ExplicitOption};
use crate::fault::Fault;
use crate::metrics::{
    CANCELLATIONS_REQUESTED_TOTAL, CLEANUP_FAILURES_TOTAL, HOOK_CLEANUP_FAILURE, HOOK_FAULTS_TOTAL,
    HOOK_FINISHED, HOOK_STARTING, LABEL_HOOK, TEST_CASE_DURATION_SECONDS,
    TEST_CASES_FINISHED_TOTAL, TEST_CASES_SKIPPED_EXECUTION_TOTAL, TEST_CASES_STARTED_TOTAL,
};
use crate::summary::RunSummary;
use crate::test_case::TestCase;

// ─── TestCaseRunner Trait ────────────────────────────────────────────

/// 테스트 케이스 러너 trait
///
/// 훅이 `Ok(false)`를 반환하면 취소를 요청하고, `Err`를 반환하면
/// 폴트가 포착되어 정리 실패로 보고됩니다.
///
/// # 구현 예시
/// ```ignore
/// struct MyRunner;
///
/// impl TestCaseRunner for MyRunner {
///     type TestCase = TestCaseDescriptor;
///
///     async fn run_test_case(
///         &self,
///         ctx: &ExecutionContext<TestCaseDescriptor>,
///         pre_fault: Option<Fault>,
///     ) -> RunSummary {
///         let failed = u32::from(pre_fault.is_some());
///         RunSummary::new(1, failed, 0, 0, ctx.elapsed().as_secs_f64())
///     }
/// }
/// ```
pub trait TestCaseRunner: Send + Sync {
    /// 이 러너가 실행하는 테스트 케이스 타입
    type TestCase: TestCase;

    /// Starting 훅. 기본 구현은 Starting 이벤트를 발행하고 계속 진행합니다.
    fn on_test_case_starting(
        &self,
        ctx: &ExecutionContext<Self::TestCase>,
    ) -> impl Future<Output = Result<bool, Fault>> + Send {
        async move {
            ctx.publish_starting();
            Ok(true)
        }
    }

    /// Execute 단계. 테스트 케이스를 실제로 실행합니다.
    ///
    /// `pre_fault`는 Starting 단계에서 포착된 폴트이며, `Some`이면
    /// 테스트 실패로 보고해야 합니다. 이 단계의 실패는 구현체가 스스로
    /// 요약에 반영합니다.
    fn run_test_case(
        &self,
        ctx: &ExecutionContext<Self::TestCase>,
        pre_fault: Option<Fault>,
    ) -> impl Future<Output = RunSummary> + Send;

    /// Finished 훅. 기본 구현은 요약을 담은 Finished 이벤트를 발행합니다.
    fn on_test_case_finished(
        &self,
        ctx: &ExecutionContext<Self::TestCase>,
        summary: RunSummary,
    ) -> impl Future<Output = Result<bool, Fault>> + Send {
        async move {
            ctx.publish_finished(&summary);
            Ok(true)
        }
    }

    /// 정리 실패 훅. 기본 구현은 평탄화된 폴트를 CleanupFailure 이벤트로 발행합니다.
    ///
    /// 보호되지 않습니다. `Err`는 에러 이벤트로 발행되며 취소를 요청하지 않습니다.
    fn on_test_case_cleanup_failure(
        &self,
        ctx: &ExecutionContext<Self::TestCase>,
        fault: &Fault,
    ) -> impl Future<Output = Result<bool, Fault>> + Send {
        async move {
            ctx.publish_cleanup_failure(fault);
            Ok(true)
        }
    }

    /// 테스트 케이스 하나를 실행하고 요약을 반환합니다.
    ///
    /// 새 [`ExecutionContext`]를 만들어 [`run_lifecycle`]에 넘깁니다.
    fn run(
        &self,
        test_case: Arc<Self::TestCase>,
        bus: Arc<dyn EventBus>,
        explicit: ExplicitOption,
        cancellation: CancellationToken,
    ) -> impl Future<Output = RunSummary> + Send {
        let ctx = ExecutionContext::new(test_case, explicit, bus, cancellation);
        run_lifecycle(self, ctx)
    }
}

// ─── Lifecycle ───────────────────────────────────────────────────────

/// 이미 만들어진 컨텍스트로 생명주기 전체를 실행합니다.
///
/// 컨텍스트를 초기화하고, 단계를 순서대로 구동한 뒤 해제합니다.
/// 초기화에 실패하면 에러 이벤트를 발행하고 0으로 채운 요약을 반환합니다.
pub async fn run_lifecycle<R>(runner: &R, mut ctx: ExecutionContext<R::TestCase>) -> RunSummary
where
    R: TestCaseRunner + ?Sized,
{
    if let Err(e) = ctx.initialize().await {
        error!(
            test_case = ctx.descriptor().display_name.as_str(),
            error = %e,
            "failed to initialize execution context"
        );
        ctx.publish_error(&Fault::from(e));
        return RunSummary::default();
    }

    metrics::counter!(TEST_CASES_STARTED_TOTAL).increment(1);
    let summary = drive(runner, &mut ctx).await;
    let elapsed = ctx.elapsed();

    debug!(
        run_id = ctx.run_id(),
        case_id = ctx.identity().case_id.as_str(),
        total = summary.total,
        failed = summary.failed,
        cancelled = ctx.is_cancellation_requested(),
        "test case lifecycle finished"
    );

    if let Err(e) = ctx.dispose().await {
        warn!(error = %e, "failed to dispose execution context");
    }

    metrics::counter!(TEST_CASES_FINISHED_TOTAL).increment(1);
    metrics::histogram!(TEST_CASE_DURATION_SECONDS).record(elapsed.as_secs_f64());
    summary
}

async fn drive<R>(runner: &R, ctx: &mut ExecutionContext<R::TestCase>) -> RunSummary
where
    R: TestCaseRunner + ?Sized,
{
    // Starting
    ctx.set_status(EngineStatus::Initializing);
    debug!(run_id = ctx.run_id(), status = %ctx.status(), "running starting hook");
    let (proceed, fault) = ctx
        .aggregator()
        .guard(true, runner.on_test_case_starting(&*ctx))
        .await;
    settle_guarded(ctx, HOOK_STARTING, proceed, fault.as_ref());

    // Execute
    let summary = if ctx.is_cancellation_requested() {
        debug!(run_id = ctx.run_id(), "cancellation requested, skipping execute");
        metrics::counter!(TEST_CASES_SKIPPED_EXECUTION_TOTAL).increment(1);
        RunSummary::default()
    } else {
        ctx.set_status(EngineStatus::Running);
        let pre_fault = ctx.aggregator().to_composite_fault();
        ctx.aggregator().clear();
        debug!(
            run_id = ctx.run_id(),
            status = %ctx.status(),
            has_pre_fault = pre_fault.is_some(),
            "running test case"
        );
        runner.run_test_case(ctx, pre_fault).await.sanitized()
    };

    // Finished
    ctx.set_status(EngineStatus::CleaningUp);
    debug!(run_id = ctx.run_id(), status = %ctx.status(), "running finished hook");
    let (proceed, fault) = ctx
        .aggregator()
        .guard(true, runner.on_test_case_finished(&*ctx, summary))
        .await;
    settle_guarded(ctx, HOOK_FINISHED, proceed, fault.as_ref());

    // 정리 실패 보고
    if let Some(fault) = ctx.aggregator().to_composite_fault() {
        metrics::counter!(CLEANUP_FAILURES_TOTAL).increment(1);
        debug!(
            run_id = ctx.run_id(),
            fault = %fault,
            "reporting cleanup failure"
        );
        match runner.on_test_case_cleanup_failure(ctx, &fault).await {
            Ok(true) => {}
            Ok(false) => {
                request_cancellation(ctx, HOOK_CLEANUP_FAILURE);
            }
            Err(reporting) => {
                error!(
                    run_id = ctx.run_id(),
                    case_id = ctx.identity().case_id.as_str(),
                    fault = %reporting,
                    "cleanup failure hook failed"
                );
                ctx.publish_error(&reporting);
            }
        }
    }

    summary
}

/// 보호된 훅의 결과를 반영합니다. 폴트는 이미 집계기에 있습니다.
fn settle_guarded<C: TestCase>(
    ctx: &ExecutionContext<C>,
    hook: &'static str,
    proceed: bool,
    fault: Option<&Fault>,
) {
    if let Some(fault) = fault {
        metrics::counter!(HOOK_FAULTS_TOTAL, LABEL_HOOK => hook).increment(1);
        warn!(
            run_id = ctx.run_id(),
            case_id = ctx.identity().case_id.as_str(),
            hook,
            fault = %fault,
            "lifecycle hook failed, fault captured"
        );
    }
    if !proceed {
        request_cancellation(ctx, hook);
    }
}

fn request_cancellation<C: TestCase>(ctx: &ExecutionContext<C>, hook: &'static str) {
    metrics::counter!(CANCELLATIONS_REQUESTED_TOTAL, LABEL_HOOK => hook).increment(1);
    debug!(run_id = ctx.run_id(), hook, "hook requested cancellation");
    ctx.request_cancellation();
}
