//! 설정 관리 — caseflow.toml 파싱 및 런타임 설정
//!
//! [`CaseflowConfig`]는 로깅과 러너 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`CASEFLOW_RUNNER_EXPLICIT=only` 형식)
//! 2. 설정 파일 (`caseflow.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), caseflow_core::error::CaseflowError> {
//! use caseflow_core::config::CaseflowConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = CaseflowConfig::load("caseflow.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = CaseflowConfig::parse("[runner]\nexplicit = \"only\"")?;
//! let explicit = config.runner.explicit_option()?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::ExplicitOption;
use crate::error::{CaseflowError, ConfigError};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// caseflow 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseflowConfig {
    /// 일반 설정 (로깅)
    #[serde(default)]
    pub general: GeneralConfig,
    /// 러너 설정
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl CaseflowConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CaseflowError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CaseflowError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CaseflowError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                CaseflowError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, CaseflowError> {
        toml::from_str(toml_str).map_err(|e| {
            CaseflowError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CASEFLOW_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "CASEFLOW_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CASEFLOW_GENERAL_LOG_FORMAT");
        override_string(&mut self.runner.explicit, "CASEFLOW_RUNNER_EXPLICIT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CaseflowError> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            }
            .into());
        }

        if !VALID_LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_FORMATS.join(", ")),
            }
            .into());
        }

        self.runner.explicit_option()?;
        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 러너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// 명시적 테스트 실행 모드 (off, on, only)
    pub explicit: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            explicit: ExplicitOption::default().to_string(),
        }
    }
}

impl RunnerConfig {
    /// `explicit` 문자열을 [`ExplicitOption`]으로 변환합니다.
    pub fn explicit_option(&self) -> Result<ExplicitOption, ConfigError> {
        self.explicit.parse()
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}
