//! 메트릭 상수 및 설명 등록
//!
//! 엔진이 기록하는 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 레코더가 설치되지 않았다면 `metrics` 매크로 호출은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `caseflow_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 훅 레이블 키 (starting, finished, cleanup_failure)
pub const LABEL_HOOK: &str = "hook";

/// 훅 레이블 값
pub const HOOK_STARTING: &str = "starting";
pub const HOOK_FINISHED: &str = "finished";
pub const HOOK_CLEANUP_FAILURE: &str = "cleanup_failure";

// ─── 실행 메트릭 ─────────────────────────────────────────────────────

/// 시작된 테스트 케이스 수 (counter)
pub const TEST_CASES_STARTED_TOTAL: &str = "caseflow_test_cases_started_total";

/// 생명주기를 끝까지 마친 테스트 케이스 수 (counter)
pub const TEST_CASES_FINISHED_TOTAL: &str = "caseflow_test_cases_finished_total";

/// 취소로 Execute 단계를 건너뛴 테스트 케이스 수 (counter)
pub const TEST_CASES_SKIPPED_EXECUTION_TOTAL: &str =
    "caseflow_test_cases_skipped_execution_total";

/// 훅이 반환한 폴트 수 (counter, label: hook)
pub const HOOK_FAULTS_TOTAL: &str = "caseflow_hook_faults_total";

/// 발행된 정리 실패 수 (counter)
pub const CLEANUP_FAILURES_TOTAL: &str = "caseflow_cleanup_failures_total";

/// 훅이 요청한 취소 수 (counter, label: hook)
pub const CANCELLATIONS_REQUESTED_TOTAL: &str = "caseflow_cancellations_requested_total";

/// 진행 중인 실행 컨텍스트 수 (gauge)
pub const RUNS_ACTIVE: &str = "caseflow_runs_active";

/// 테스트 케이스 하나의 생명주기 소요 시간 (histogram, 초)
pub const TEST_CASE_DURATION_SECONDS: &str = "caseflow_test_case_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        TEST_CASES_STARTED_TOTAL,
        "Total number of test cases that entered the lifecycle"
    );
    describe_counter!(
        TEST_CASES_FINISHED_TOTAL,
        "Total number of test cases that completed the lifecycle"
    );
    describe_counter!(
        TEST_CASES_SKIPPED_EXECUTION_TOTAL,
        "Test cases whose execute step was skipped due to cancellation"
    );
    describe_counter!(
        HOOK_FAULTS_TOTAL,
        "Faults returned by lifecycle hooks (label: hook)"
    );
    describe_counter!(
        CLEANUP_FAILURES_TOTAL,
        "Cleanup failures reported after the finished hook"
    );
    describe_counter!(
        CANCELLATIONS_REQUESTED_TOTAL,
        "Cancellation requests made by lifecycle hooks (label: hook)"
    );
    describe_gauge!(RUNS_ACTIVE, "Execution contexts currently initialized");
    describe_histogram!(
        TEST_CASE_DURATION_SECONDS,
        "Wall-clock duration of one test case lifecycle in seconds"
    );
}
