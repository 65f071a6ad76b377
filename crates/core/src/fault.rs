//! 폴트 — 훅이 던진 실패를 값으로 담고, 모으고, 평탄화합니다.
//!
//! [`Fault`]는 타입명, 메시지, 스택 트레이스, 자식 폴트로 이루어진 트리입니다.
//! [`FaultAggregator`]는 보호된 훅 호출에서 발생한 폴트를 포착 순서대로 모으며,
//! [`Fault::flatten`]은 트리를 부모 인덱스로 연결된 평행 배열
//! ([`FlattenedFault`])로 바꿔 이벤트에 실을 수 있게 합니다.
//!
//! # 평탄화 예시
//! ```text
//! Aggregate                 types   = [Aggregate, A, A.source, B]
//! ├── A                     parents = [-1,        0, 1,        0]
//! │   └── A.source
//! └── B
//! ```

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// 복합 폴트의 타입명
pub const AGGREGATE_FAULT_TYPE: &str = "caseflow_core::fault::AggregateFault";

/// 복합 폴트의 메시지
pub const AGGREGATE_FAULT_MESSAGE: &str = "One or more errors occurred.";

/// `source()` 체인에서 타입명을 알아낼 수 없을 때 사용하는 이름
const UNKNOWN_SOURCE_TYPE: &str = "dyn std::error::Error";

/// 원인 체인의 `std::io::Error`에 붙는 타입명
const IO_ERROR_TYPE: &str = "std::io::Error";

// ─── Fault ───────────────────────────────────────────────────────────

/// 포착된 실패 하나
///
/// 자식이 있으면 복합 폴트입니다. 자식은 원인 체인(`source()`)일 수도 있고,
/// [`Fault::aggregate`]로 묶인 여러 독립 폴트일 수도 있습니다.
///
/// 어떤 `std::error::Error` 타입이든 `From`으로 변환되므로 훅 안에서 `?`를
/// 그대로 사용할 수 있습니다. 이 blanket 변환 때문에 `Fault` 자신은
/// `std::error::Error`를 구현하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    type_name: String,
    message: String,
    stack_trace: Option<String>,
    children: Vec<Fault>,
}

impl Fault {
    /// 타입명과 메시지로 단일 폴트를 생성합니다.
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            stack_trace: None,
            children: Vec::new(),
        }
    }

    /// 여러 폴트를 순서대로 자식으로 갖는 복합 폴트를 생성합니다.
    pub fn aggregate(children: Vec<Fault>) -> Self {
        Self {
            type_name: AGGREGATE_FAULT_TYPE.to_owned(),
            message: AGGREGATE_FAULT_MESSAGE.to_owned(),
            stack_trace: None,
            children,
        }
    }

    /// 스택 트레이스를 지정합니다.
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// 자식 폴트를 추가합니다.
    pub fn with_child(mut self, child: Fault) -> Self {
        self.children.push(child);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }

    pub fn children(&self) -> &[Fault] {
        &self.children
    }

    /// 자식 폴트가 있는지 여부
    pub fn is_composite(&self) -> bool {
        !self.children.is_empty()
    }

    /// 폴트 트리를 전위 순회하여 평행 배열로 평탄화합니다.
    ///
    /// 루트의 부모 인덱스는 `-1`이고, 나머지 노드는 같은 배열 안에서
    /// 부모 노드의 0 기반 인덱스를 가집니다.
    pub fn flatten(&self) -> FlattenedFault {
        let mut flat = FlattenedFault::default();
        let mut pending: Vec<(&Fault, i32)> = vec![(self, -1)];

        while let Some((fault, parent)) = pending.pop() {
            let index = flat.len() as i32;
            flat.exception_types.push(fault.type_name.clone());
            flat.messages.push(fault.message.clone());
            flat.stack_traces.push(fault.stack_trace.clone());
            flat.exception_parent_indices.push(parent);

            // 역순으로 쌓아야 자식이 원래 순서대로 꺼내집니다.
            for child in fault.children.iter().rev() {
                pending.push((child, index));
            }
        }

        flat
    }

    fn from_source(source: &(dyn StdError + 'static)) -> Self {
        let mut fault = Self::new(debug_type_name(source), source.to_string());
        if let Some(inner) = source.source() {
            fault.children.push(Self::from_source(inner));
        }
        fault
    }
}

/// 최상위 에러의 타입명은 `std::any::type_name`으로 정확히 기록됩니다.
/// `source()` 체인의 원인은 `dyn Error`로만 보이므로 `Debug` 출력에서 타입명을
/// 추정하며, 추정할 수 없으면 `dyn std::error::Error`가 됩니다.
impl<E> From<E> for Fault
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        let mut fault = Self::new(std::any::type_name::<E>(), error.to_string());

        // RUST_BACKTRACE / RUST_LIB_BACKTRACE가 설정된 경우에만 실제로 캡처됩니다.
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            fault.stack_trace = Some(backtrace.to_string());
        }

        if let Some(source) = error.source() {
            fault.children.push(Self::from_source(source));
        }
        fault
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)?;
        if !self.children.is_empty() {
            write!(f, " ({} inner)", self.children.len())?;
        }
        Ok(())
    }
}

/// `Debug` 출력의 선두 식별자로 원인 에러의 타입명을 추정합니다.
///
/// 예: `ParseIntError { kind: InvalidDigit }` → `ParseIntError`
///
/// `io::Error`는 `Os { .. }`, `Custom { .. }`처럼 내부 표현만 출력하므로
/// 직접 식별합니다. 소문자로 시작하는 식별자는 타입명이 아니므로 버립니다.
fn debug_type_name(source: &(dyn StdError + 'static)) -> String {
    if source.is::<std::io::Error>() {
        return IO_ERROR_TYPE.to_owned();
    }

    let debug = format!("{source:?}");
    let name: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();
    let looks_like_type = name.contains("::") || name.starts_with(char::is_uppercase);
    if looks_like_type {
        name
    } else {
        UNKNOWN_SOURCE_TYPE.to_owned()
    }
}

// ─── FlattenedFault ──────────────────────────────────────────────────

/// 평탄화된 폴트 트리
///
/// 네 배열의 길이는 항상 같으며, `i`번째 원소들이 하나의 노드를 이룹니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenedFault {
    /// 노드별 타입명
    pub exception_types: Vec<String>,
    /// 노드별 메시지
    pub messages: Vec<String>,
    /// 노드별 스택 트레이스 (없을 수 있음)
    pub stack_traces: Vec<Option<String>>,
    /// 노드별 부모 인덱스 (루트는 `-1`)
    pub exception_parent_indices: Vec<i32>,
}

impl FlattenedFault {
    /// 노드 수
    pub fn len(&self) -> usize {
        self.exception_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exception_types.is_empty()
    }
}

impl From<&Fault> for FlattenedFault {
    fn from(fault: &Fault) -> Self {
        fault.flatten()
    }
}

// ─── FaultAggregator ─────────────────────────────────────────────────

/// 폴트 집계기
///
/// 보호된 작업에서 발생한 폴트를 포착 순서대로 보관합니다.
/// 하나의 실행 컨텍스트가 독점하며, 여러 실행이 공유해서는 안 됩니다.
/// 내부 `Mutex`는 컨텍스트를 `Send` future에서 빌려 쓰기 위한 것입니다.
#[derive(Debug, Default)]
pub struct FaultAggregator {
    faults: Mutex<Vec<Fault>>,
}

impl FaultAggregator {
    /// 빈 집계기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    fn faults(&self) -> MutexGuard<'_, Vec<Fault>> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 폴트를 순서대로 추가합니다.
    pub fn capture(&self, fault: Fault) {
        self.faults().push(fault);
    }

    /// 포착된 폴트가 하나라도 있는지 여부
    pub fn has_faults(&self) -> bool {
        !self.faults().is_empty()
    }

    /// 포착된 폴트 수
    pub fn len(&self) -> usize {
        self.faults().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_faults()
    }

    /// 포착된 폴트를 하나의 폴트로 합칩니다.
    ///
    /// - 없으면 `None`
    /// - 하나면 그 폴트를 그대로
    /// - 여럿이면 포착 순서대로 자식을 갖는 복합 폴트
    ///
    /// 상태를 비우지 않습니다.
    pub fn to_composite_fault(&self) -> Option<Fault> {
        match self.faults().as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(Fault::aggregate(many.to_vec())),
        }
    }

    /// 모든 폴트를 비웁니다.
    pub fn clear(&self) {
        self.faults().clear();
    }

    /// 모든 폴트를 꺼내고 집계기를 비웁니다.
    pub fn take(&self) -> Vec<Fault> {
        std::mem::take(&mut *self.faults())
    }

    /// 작업을 보호된 상태로 실행합니다.
    ///
    /// 작업이 `Err`를 반환하면 폴트를 포착하고 `default`를 결과로 돌려줍니다.
    /// 두 번째 값은 이번 호출에서 포착된 폴트입니다.
    pub async fn guard<T, F>(&self, default: T, operation: F) -> (T, Option<Fault>)
    where
        F: Future<Output = Result<T, Fault>>,
    {
        match operation.await {
            Ok(value) => (value, None),
            Err(fault) => {
                self.capture(fault.clone());
                (default, Some(fault))
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
