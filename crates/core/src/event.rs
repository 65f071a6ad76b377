//! 생명주기 이벤트 — 러너가 이벤트 버스로 발행하는 메시지
//!
//! 모든 이벤트는 [`TestCaseIdentity`]를 포함하며, 한 실행에서 발행되는
//! 이벤트들의 식별자는 모두 동일합니다. 발행 이후에는 변경되지 않습니다.
//! [`LifecycleEvent`]는 버스가 다루는 단일 타입이며 `"type"` 태그로 직렬화됩니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fault::{Fault, FlattenedFault};
use crate::summary::RunSummary;
use crate::test_case::{TestCaseDescriptor, TestCaseIdentity};

// --- 이벤트 타입 상수 ---

/// 테스트 케이스 시작 이벤트 타입
pub const EVENT_TYPE_STARTING: &str = "test_case_starting";
/// 테스트 케이스 종료 이벤트 타입
pub const EVENT_TYPE_FINISHED: &str = "test_case_finished";
/// 정리 실패 이벤트 타입
pub const EVENT_TYPE_CLEANUP_FAILURE: &str = "test_case_cleanup_failure";
/// 일반 에러 이벤트 타입
pub const EVENT_TYPE_ERROR: &str = "error";

/// 모든 생명주기 이벤트가 구현하는 기본 trait
pub trait Event: Send + Sync + 'static {
    /// 이벤트가 속한 테스트 케이스의 식별자 체인
    fn identity(&self) -> &TestCaseIdentity;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

/// 테스트 케이스 시작 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseStarting {
    #[serde(flatten)]
    pub identity: TestCaseIdentity,
    pub explicit: bool,
    pub skip_reason: Option<String>,
    pub source_file_path: Option<String>,
    pub source_line_number: Option<u32>,
    pub test_case_display_name: String,
    pub test_class_name: Option<String>,
    pub test_class_namespace: Option<String>,
    pub test_class_simple_name: Option<String>,
    pub test_method_name: Option<String>,
    pub traits: BTreeMap<String, Vec<String>>,
}

impl TestCaseStarting {
    /// 테스트 케이스 메타데이터를 그대로 복사해 시작 이벤트를 만듭니다.
    pub fn from_descriptor(descriptor: &TestCaseDescriptor) -> Self {
        Self {
            identity: descriptor.identity.clone(),
            explicit: descriptor.explicit,
            skip_reason: descriptor.skip_reason.clone(),
            source_file_path: descriptor.source_file_path.clone(),
            source_line_number: descriptor.source_line_number,
            test_case_display_name: descriptor.display_name.clone(),
            test_class_name: descriptor.class_name.clone(),
            test_class_namespace: descriptor.class_namespace.clone(),
            test_class_simple_name: descriptor.class_simple_name.clone(),
            test_method_name: descriptor.method_name.clone(),
            traits: descriptor.traits.clone(),
        }
    }
}

impl Event for TestCaseStarting {
    fn identity(&self) -> &TestCaseIdentity {
        &self.identity
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_STARTING
    }
}

impl fmt::Display for TestCaseStarting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TestCaseStarting[{}] name={} explicit={}",
            self.identity.case_id, self.test_case_display_name, self.explicit,
        )
    }
}

/// 테스트 케이스 종료 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseFinished {
    #[serde(flatten)]
    pub identity: TestCaseIdentity,
    /// 실행 시간 (초)
    pub execution_time: f64,
    pub tests_failed: u32,
    pub tests_not_run: u32,
    pub tests_skipped: u32,
    pub tests_total: u32,
}

impl TestCaseFinished {
    pub fn new(identity: TestCaseIdentity, summary: &RunSummary) -> Self {
        Self {
            identity,
            execution_time: summary.sanitized().time,
            tests_failed: summary.failed,
            tests_not_run: summary.not_run,
            tests_skipped: summary.skipped,
            tests_total: summary.total,
        }
    }

    /// 이벤트에 담긴 값을 실행 요약으로 되돌립니다.
    pub fn summary(&self) -> RunSummary {
        RunSummary::new(
            self.tests_total,
            self.tests_failed,
            self.tests_skipped,
            self.tests_not_run,
            self.execution_time,
        )
    }
}

impl Event for TestCaseFinished {
    fn identity(&self) -> &TestCaseIdentity {
        &self.identity
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_FINISHED
    }
}

impl fmt::Display for TestCaseFinished {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TestCaseFinished[{}] total={} failed={} skipped={} not_run={} time={}",
            self.identity.case_id,
            self.tests_total,
            self.tests_failed,
            self.tests_skipped,
            self.tests_not_run,
            self.execution_time,
        )
    }
}

/// 정리 실패 이벤트
///
/// Finished 이후에도 집계기에 남은 폴트를 평탄화해 전달합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseCleanupFailure {
    #[serde(flatten)]
    pub identity: TestCaseIdentity,
    #[serde(flatten)]
    pub fault: FlattenedFault,
}

impl TestCaseCleanupFailure {
    pub fn new(identity: TestCaseIdentity, fault: &Fault) -> Self {
        Self {
            identity,
            fault: fault.flatten(),
        }
    }
}

impl Event for TestCaseCleanupFailure {
    fn identity(&self) -> &TestCaseIdentity {
        &self.identity
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_CLEANUP_FAILURE
    }
}

impl fmt::Display for TestCaseCleanupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TestCaseCleanupFailure[{}] {}",
            self.identity.case_id,
            describe_root(&self.fault),
        )
    }
}

/// 일반 에러 이벤트
///
/// 더 이상 보고할 생명주기 단계가 없을 때 발생한 폴트를 전달합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(flatten)]
    pub identity: TestCaseIdentity,
    #[serde(flatten)]
    pub fault: FlattenedFault,
}

impl ErrorMessage {
    pub fn new(identity: TestCaseIdentity, fault: &Fault) -> Self {
        Self {
            identity,
            fault: fault.flatten(),
        }
    }
}

impl Event for ErrorMessage {
    fn identity(&self) -> &TestCaseIdentity {
        &self.identity
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_ERROR
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ErrorMessage[{}] {}",
            self.identity.case_id,
            describe_root(&self.fault),
        )
    }
}

/// 이벤트 버스가 다루는 생명주기 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Starting(TestCaseStarting),
    Finished(TestCaseFinished),
    CleanupFailure(TestCaseCleanupFailure),
    Error(ErrorMessage),
}

impl LifecycleEvent {
    fn inner(&self) -> &dyn Event {
        match self {
            Self::Starting(e) => e,
            Self::Finished(e) => e,
            Self::CleanupFailure(e) => e,
            Self::Error(e) => e,
        }
    }

    pub fn as_starting(&self) -> Option<&TestCaseStarting> {
        match self {
            Self::Starting(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_finished(&self) -> Option<&TestCaseFinished> {
        match self {
            Self::Finished(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_cleanup_failure(&self) -> Option<&TestCaseCleanupFailure> {
        match self {
            Self::CleanupFailure(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorMessage> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl Event for LifecycleEvent {
    fn identity(&self) -> &TestCaseIdentity {
        self.inner().identity()
    }

    fn event_type(&self) -> &str {
        self.inner().event_type()
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting(e) => fmt::Display::fmt(e, f),
            Self::Finished(e) => fmt::Display::fmt(e, f),
            Self::CleanupFailure(e) => fmt::Display::fmt(e, f),
            Self::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl From<TestCaseStarting> for LifecycleEvent {
    fn from(event: TestCaseStarting) -> Self {
        Self::Starting(event)
    }
}

impl From<TestCaseFinished> for LifecycleEvent {
    fn from(event: TestCaseFinished) -> Self {
        Self::Finished(event)
    }
}

impl From<TestCaseCleanupFailure> for LifecycleEvent {
    fn from(event: TestCaseCleanupFailure) -> Self {
        Self::CleanupFailure(event)
    }
}

impl From<ErrorMessage> for LifecycleEvent {
    fn from(event: ErrorMessage) -> Self {
        Self::Error(event)
    }
}

/// 평탄화된 폴트의 루트 노드를 `type: message` 형태로 표시합니다.
fn describe_root(fault: &FlattenedFault) -> String {
    match (fault.exception_types.first(), fault.messages.first()) {
        (Some(ty), Some(msg)) => format!("{ty}: {msg} (nodes={})", fault.len()),
        _ => "<empty>".to_owned(),
    }
}
