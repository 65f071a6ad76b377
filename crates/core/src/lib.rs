#![doc = include_str!("../README.md")]

pub mod bus;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod fault;
pub mod logging;
pub mod metrics;
pub mod runner;
pub mod summary;
pub mod test_case;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{CaseflowError, ConfigError, ContextError};

// 설정
pub use config::CaseflowConfig;

// 이벤트 및 버스
pub use bus::{ChannelEventBus, EventBus, JsonLinesEventBus, RecordingEventBus};
pub use event::{
    ErrorMessage, Event, LifecycleEvent, TestCaseCleanupFailure, TestCaseFinished,
    TestCaseStarting,
};

// 폴트
pub use fault::{Fault, FaultAggregator, FlattenedFault};

// 실행
pub use context::{EngineStatus, ExecutionContext, ExplicitOption};
pub use runner::{TestCaseRunner, run_lifecycle};
pub use summary::RunSummary;
pub use test_case::{TestCase, TestCaseDescriptor, TestCaseIdentity};
