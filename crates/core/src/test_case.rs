//! 테스트 케이스 — 엔진이 알아야 하는 식별 정보와 표시 정보
//!
//! 테스트 케이스의 발견/생성은 이 크레이트의 관심사가 아닙니다.
//! 엔진은 [`TestCase`] trait을 통해 식별자와 메타데이터만 읽습니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 테스트 케이스 식별자 체인
///
/// 모든 값은 불투명한 상관관계 문자열이며, 한 실행에서 발행되는
/// 모든 이벤트에 그대로 복사됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestCaseIdentity {
    /// 어셈블리 고유 ID
    pub assembly_id: String,
    /// 테스트 컬렉션 고유 ID
    pub collection_id: String,
    /// 테스트 클래스 고유 ID
    pub class_id: String,
    /// 테스트 메서드 고유 ID
    pub method_id: String,
    /// 테스트 케이스 고유 ID
    pub case_id: String,
}

impl TestCaseIdentity {
    pub fn new(
        assembly_id: impl Into<String>,
        collection_id: impl Into<String>,
        class_id: impl Into<String>,
        method_id: impl Into<String>,
        case_id: impl Into<String>,
    ) -> Self {
        Self {
            assembly_id: assembly_id.into(),
            collection_id: collection_id.into(),
            class_id: class_id.into(),
            method_id: method_id.into(),
            case_id: case_id.into(),
        }
    }
}

impl fmt::Display for TestCaseIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.assembly_id, self.collection_id, self.class_id, self.method_id, self.case_id,
        )
    }
}

/// 엔진이 구동할 수 있는 테스트 케이스
///
/// 실행 동안 불변이어야 합니다.
pub trait TestCase: Send + Sync + 'static {
    /// 식별 정보와 표시 정보
    fn descriptor(&self) -> &TestCaseDescriptor;
}

/// 테스트 케이스 메타데이터
///
/// Starting 이벤트에 실리는 모든 표시 정보를 담습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseDescriptor {
    pub identity: TestCaseIdentity,
    pub display_name: String,
    /// 명시적으로 요청할 때만 실행되는 케이스인지 여부
    pub explicit: bool,
    pub skip_reason: Option<String>,
    pub source_file_path: Option<String>,
    pub source_line_number: Option<u32>,
    pub class_name: Option<String>,
    pub class_namespace: Option<String>,
    pub class_simple_name: Option<String>,
    pub method_name: Option<String>,
    /// 트레이트 (키 → 값 목록)
    pub traits: BTreeMap<String, Vec<String>>,
}

impl TestCaseDescriptor {
    /// 식별자와 표시 이름만으로 메타데이터를 생성합니다.
    pub fn new(identity: TestCaseIdentity, display_name: impl Into<String>) -> Self {
        Self {
            identity,
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    pub fn with_skip_reason(mut self, reason: impl Into<String>) -> Self {
        self.skip_reason = Some(reason.into());
        self
    }

    /// 소스 위치를 지정합니다.
    pub fn with_source(mut self, file_path: impl Into<String>, line_number: u32) -> Self {
        self.source_file_path = Some(file_path.into());
        self.source_line_number = Some(line_number);
        self
    }

    /// 정규화된 클래스 이름(`namespace.Simple`)으로 클래스 정보를 채웁니다.
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        match class_name.rsplit_once('.') {
            Some((namespace, simple)) => {
                self.class_namespace = Some(namespace.to_owned());
                self.class_simple_name = Some(simple.to_owned());
            }
            None => {
                self.class_namespace = None;
                self.class_simple_name = Some(class_name.clone());
            }
        }
        self.class_name = Some(class_name);
        self
    }

    pub fn with_method(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = Some(method_name.into());
        self
    }

    /// 트레이트 값을 추가합니다. 같은 키의 값은 추가 순서대로 누적됩니다.
    pub fn with_trait(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.traits.entry(key.into()).or_default().push(value.into());
        self
    }
}

impl TestCase for TestCaseDescriptor {
    fn descriptor(&self) -> &TestCaseDescriptor {
        self
    }
}

impl fmt::Display for TestCaseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.display_name, self.identity.case_id)
    }
}
