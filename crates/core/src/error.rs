//! 에러 타입 — 도메인별 에러 정의
//!
//! 훅에서 발생한 실패는 에러가 아니라 [`Fault`](crate::fault::Fault)로 다룹니다.
//! 여기의 타입은 설정 로딩과 실행 컨텍스트 관리처럼
//! 엔진 바깥으로 전파되는 실패만 표현합니다.

/// caseflow 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum CaseflowError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 실행 컨텍스트 생명주기 에러
    #[error("context error: {0}")]
    Context(#[from] ContextError),

    /// 로깅 초기화 에러
    #[error("logging error: {reason}")]
    Logging { reason: String },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 실행 컨텍스트 생명주기 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// `initialize()`가 두 번 호출됨
    #[error("execution context for '{test_case}' is already initialized")]
    AlreadyInitialized { test_case: String },

    /// 초기화 전에 사용됨
    #[error("execution context for '{test_case}' is not initialized")]
    NotInitialized { test_case: String },
}
