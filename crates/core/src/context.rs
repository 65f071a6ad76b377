//! 실행 컨텍스트 — 테스트 케이스 한 번의 실행에 필요한 모든 상태
//!
//! [`ExecutionContext`]는 테스트 케이스, 명시 실행 모드, 이벤트 버스,
//! 폴트 집계기, 취소 신호를 묶습니다. 러너 타입은 상태를 갖지 않으며
//! 실행별 가변 상태는 모두 여기에 있습니다.
//!
//! # 생명주기
//! ```text
//! new() → initialize() → (훅, Execute) → dispose()
//! ```
//!
//! `dispose()`는 `self`를 소비하므로 두 번 호출될 수 없습니다. 해제되지 않은 채
//! 드롭되면 (패닉 전파, future 취소) `Drop`이 같은 자원을 반납합니다.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::bus::EventBus;
use crate::error::{ConfigError, ContextError};
use crate::event::{
    ErrorMessage, LifecycleEvent, TestCaseCleanupFailure, TestCaseFinished, TestCaseStarting,
};
use crate::fault::{Fault, FaultAggregator};
use crate::metrics::RUNS_ACTIVE;
use crate::summary::RunSummary;
use crate::test_case::{TestCase, TestCaseDescriptor, TestCaseIdentity};

// ─── ExplicitOption ──────────────────────────────────────────────────

/// 명시적(explicit) 테스트 실행 모드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplicitOption {
    /// 명시적 테스트를 실행하지 않음
    #[default]
    Off,
    /// 모든 테스트를 실행
    On,
    /// 명시적 테스트만 실행
    Only,
}

impl ExplicitOption {
    /// 이 모드에서 해당 테스트를 실행해야 하는지 여부
    pub fn should_run(self, explicit_test: bool) -> bool {
        match self {
            Self::Off => !explicit_test,
            Self::On => true,
            Self::Only => explicit_test,
        }
    }
}

impl fmt::Display for ExplicitOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::On => write!(f, "on"),
            Self::Only => write!(f, "only"),
        }
    }
}

impl FromStr for ExplicitOption {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "on" => Ok(Self::On),
            "only" => Ok(Self::Only),
            other => Err(ConfigError::InvalidValue {
                field: "runner.explicit".to_owned(),
                reason: format!("unknown explicit option '{other}', expected off, on or only"),
            }),
        }
    }
}

// ─── EngineStatus ────────────────────────────────────────────────────

/// 러너가 현재 수행 중인 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    /// Starting 훅 실행 중
    Initializing,
    /// Execute 단계 실행 중
    Running,
    /// Finished 훅과 정리 실패 보고 중
    CleaningUp,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Running => write!(f, "running"),
            Self::CleaningUp => write!(f, "cleaning-up"),
        }
    }
}

// ─── ExecutionContext ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextState {
    Created,
    Initialized,
    Disposed,
}

/// 테스트 케이스 실행 컨텍스트
///
/// 폴트 집계기는 컨텍스트가 독점하고, 이벤트 버스와 취소 토큰은
/// 호출자와 공유합니다 (컨텍스트보다 오래 삽니다).
pub struct ExecutionContext<C: TestCase> {
    test_case: Arc<C>,
    explicit: ExplicitOption,
    bus: Arc<dyn EventBus>,
    aggregator: FaultAggregator,
    cancellation: CancellationToken,
    status: EngineStatus,
    state: ContextState,
    run_id: Option<String>,
    started_at: Option<Instant>,
}

impl<C: TestCase> ExecutionContext<C> {
    /// 빈 폴트 집계기로 새 컨텍스트를 생성합니다.
    ///
    /// 사용 전에 [`initialize`](Self::initialize)를 호출해야 합니다.
    pub fn new(
        test_case: Arc<C>,
        explicit: ExplicitOption,
        bus: Arc<dyn EventBus>,
        cancellation: CancellationToken,
    ) -> Self {
        Self::with_aggregator(test_case, explicit, bus, FaultAggregator::new(), cancellation)
    }

    /// 주어진 폴트 집계기를 넘겨받아 새 컨텍스트를 생성합니다.
    ///
    /// 집계기는 이동되므로 컨텍스트가 독점합니다. 이미 담긴 폴트는
    /// Starting 단계에서 포착된 폴트와 같이 취급됩니다.
    pub fn with_aggregator(
        test_case: Arc<C>,
        explicit: ExplicitOption,
        bus: Arc<dyn EventBus>,
        aggregator: FaultAggregator,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            test_case,
            explicit,
            bus,
            aggregator,
            cancellation,
            status: EngineStatus::Initializing,
            state: ContextState::Created,
            run_id: None,
            started_at: None,
        }
    }

    /// 컨텍스트를 초기화합니다. 정확히 한 번 호출해야 합니다.
    ///
    /// 로그 상관관계를 위한 실행 ID를 발급하고, 시작 시각을 기록하고,
    /// 활성 실행 게이지를 올립니다.
    pub async fn initialize(&mut self) -> Result<(), ContextError> {
        if self.state != ContextState::Created {
            return Err(ContextError::AlreadyInitialized {
                test_case: self.descriptor().display_name.clone(),
            });
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        debug!(
            run_id = run_id.as_str(),
            test_case = self.descriptor().display_name.as_str(),
            explicit = %self.explicit,
            "execution context initialized"
        );

        self.run_id = Some(run_id);
        self.started_at = Some(Instant::now());
        self.state = ContextState::Initialized;
        metrics::gauge!(RUNS_ACTIVE).increment(1.0);
        Ok(())
    }

    /// 컨텍스트를 해제하고 초기화 때 획득한 자원을 반납합니다.
    ///
    /// 초기화되지 않은 컨텍스트는 반납할 자원이 없으므로 에러를 반환합니다.
    pub async fn dispose(mut self) -> Result<(), ContextError> {
        if self.state != ContextState::Initialized {
            self.state = ContextState::Disposed;
            return Err(ContextError::NotInitialized {
                test_case: self.descriptor().display_name.clone(),
            });
        }
        self.release();
        Ok(())
    }

    fn release(&mut self) {
        metrics::gauge!(RUNS_ACTIVE).decrement(1.0);
        debug!(
            run_id = self.run_id(),
            elapsed_ms = self.elapsed().as_millis() as u64,
            "execution context disposed"
        );
        self.state = ContextState::Disposed;
    }

    /// 초기화 여부
    pub fn is_initialized(&self) -> bool {
        self.state == ContextState::Initialized
    }

    pub fn test_case(&self) -> &Arc<C> {
        &self.test_case
    }

    pub fn descriptor(&self) -> &TestCaseDescriptor {
        self.test_case.descriptor()
    }

    pub fn identity(&self) -> &TestCaseIdentity {
        &self.descriptor().identity
    }

    pub fn explicit(&self) -> ExplicitOption {
        self.explicit
    }

    /// 명시 실행 모드에 따라 이 테스트 케이스를 실행해야 하는지 여부
    ///
    /// Execute 구현체가 실행 여부를 결정할 때 사용합니다.
    pub fn should_run(&self) -> bool {
        self.explicit.should_run(self.descriptor().explicit)
    }

    pub fn message_bus(&self) -> &Arc<dyn EventBus> {
        &self.bus
    }

    /// 이벤트 버스로 이벤트를 발행합니다.
    pub fn publish(&self, event: impl Into<LifecycleEvent>) {
        self.bus.publish(event.into());
    }

    /// 테스트 케이스 메타데이터로 Starting 이벤트를 발행합니다.
    pub fn publish_starting(&self) {
        self.publish(TestCaseStarting::from_descriptor(self.descriptor()));
    }

    /// 실행 요약으로 Finished 이벤트를 발행합니다.
    pub fn publish_finished(&self, summary: &RunSummary) {
        self.publish(TestCaseFinished::new(self.identity().clone(), summary));
    }

    /// 평탄화된 폴트로 CleanupFailure 이벤트를 발행합니다.
    pub fn publish_cleanup_failure(&self, fault: &Fault) {
        self.publish(TestCaseCleanupFailure::new(self.identity().clone(), fault));
    }

    /// 평탄화된 폴트로 일반 에러 이벤트를 발행합니다.
    pub fn publish_error(&self, fault: &Fault) {
        self.publish(ErrorMessage::new(self.identity().clone(), fault));
    }

    pub fn aggregator(&self) -> &FaultAggregator {
        &self.aggregator
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// 취소가 요청되었는지 여부
    pub fn is_cancellation_requested(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// 취소를 요청합니다. 여러 번 호출해도 결과는 같습니다.
    pub fn request_cancellation(&self) {
        self.cancellation.cancel();
    }

    /// 현재 러너 단계
    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: EngineStatus) {
        self.status = status;
    }

    /// 실행 ID (초기화 전에는 빈 문자열)
    pub fn run_id(&self) -> &str {
        self.run_id.as_deref().unwrap_or_default()
    }

    /// 초기화 이후 경과 시간
    pub fn elapsed(&self) -> Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }
}

impl<C: TestCase> Drop for ExecutionContext<C> {
    fn drop(&mut self) {
        if self.state == ContextState::Initialized {
            warn!(
                run_id = self.run_id(),
                test_case = self.descriptor().display_name.as_str(),
                "execution context dropped without dispose, releasing resources"
            );
            self.release();
        }
    }
}

impl<C: TestCase> fmt::Debug for ExecutionContext<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("test_case", self.descriptor())
            .field("explicit", &self.explicit)
            .field("aggregator", &self.aggregator)
            .field("cancelled", &self.cancellation.is_cancelled())
            .field("status", &self.status)
            .field("state", &self.state)
            .field("run_id", &self.run_id)
            .finish()
    }
}
