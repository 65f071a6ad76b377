//! 실행 요약 — 테스트 케이스 한 번의 실행 결과

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// 테스트 케이스 실행 요약
///
/// Execute 단계가 정확히 한 번 생성하며, 실행이 건너뛰어지면
/// 모든 값이 0인 [`RunSummary::default`]가 대신 사용됩니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// 실행된 테스트 수
    pub total: u32,
    /// 실패한 테스트 수
    pub failed: u32,
    /// 건너뛴 테스트 수
    pub skipped: u32,
    /// 실행되지 않은 테스트 수
    pub not_run: u32,
    /// 경과 시간 (초, 음수가 아님)
    pub time: f64,
}

impl RunSummary {
    /// 새 요약을 생성합니다.
    ///
    /// 음수이거나 NaN인 시간은 0으로 보정합니다.
    pub fn new(total: u32, failed: u32, skipped: u32, not_run: u32, time: f64) -> Self {
        Self {
            total,
            failed,
            skipped,
            not_run,
            time: sanitize_time(time),
        }
    }

    /// 시간을 보정한 요약을 반환합니다.
    ///
    /// 필드를 직접 채워 만든 요약에도 [`new`](Self::new)와 같은 규칙을 적용합니다.
    pub fn sanitized(self) -> Self {
        Self {
            time: sanitize_time(self.time),
            ..self
        }
    }

    /// 모든 값이 0인지 여부
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// 다른 요약을 누적합니다.
    ///
    /// 상위 러너(클래스, 어셈블리 단위)가 케이스별 결과를 합산할 때 사용합니다.
    pub fn aggregate(&mut self, other: RunSummary) {
        self.total = self.total.saturating_add(other.total);
        self.failed = self.failed.saturating_add(other.failed);
        self.skipped = self.skipped.saturating_add(other.skipped);
        self.not_run = self.not_run.saturating_add(other.not_run);
        self.time = sanitize_time(self.time + other.time);
    }
}

impl Add for RunSummary {
    type Output = RunSummary;

    fn add(mut self, rhs: RunSummary) -> Self::Output {
        self.aggregate(rhs);
        self
    }
}

impl AddAssign for RunSummary {
    fn add_assign(&mut self, rhs: RunSummary) {
        self.aggregate(rhs);
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} failed={} skipped={} not_run={} time={:.3}s",
            self.total, self.failed, self.skipped, self.not_run, self.time,
        )
    }
}

fn sanitize_time(time: f64) -> f64 {
    if time.is_nan() || time < 0.0 { 0.0 } else { time }
}
