//! 이벤트 버스 — 생명주기 이벤트를 기록하거나 전달합니다.
//!
//! 발행 순서가 곧 관찰 순서이며, 중복 제거나 버퍼링 보장은 없습니다.
//! 전달은 프로세스 내에서 동기적으로 이루어지고, 전달 실패는 엔진의
//! 관심사가 아닙니다. 여러 실행이 하나의 버스를 공유할 수 있으므로
//! 구현체는 동시 발행에 안전해야 합니다.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::warn;

use crate::event::{Event, LifecycleEvent};

/// 생명주기 이벤트 발행 trait
pub trait EventBus: Send + Sync {
    /// 이벤트를 발행합니다.
    fn publish(&self, event: LifecycleEvent);
}

impl<B: EventBus + ?Sized> EventBus for Arc<B> {
    fn publish(&self, event: LifecycleEvent) {
        (**self).publish(event);
    }
}

// ─── RecordingEventBus ───────────────────────────────────────────────

/// 발행된 이벤트를 순서대로 기록하는 버스
///
/// 실제 전송 계층 없이 러너의 동작을 검증할 때 사용합니다.
#[derive(Debug, Default)]
pub struct RecordingEventBus {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingEventBus {
    /// 빈 버스를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LifecycleEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 지금까지 기록된 이벤트의 사본
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.lock().clone()
    }

    /// 기록된 이벤트 수
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 기록된 이벤트를 모두 꺼냅니다.
    pub fn take(&self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// 기록된 이벤트 타입명 목록
    pub fn event_types(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|e| e.event_type().to_owned())
            .collect()
    }
}

impl EventBus for RecordingEventBus {
    fn publish(&self, event: LifecycleEvent) {
        self.lock().push(event);
    }
}

// ─── ChannelEventBus ─────────────────────────────────────────────────

/// 이벤트를 tokio mpsc 채널로 전달하는 버스
///
/// 채널은 unbounded이므로 발행자는 기다리지 않습니다.
/// 수신 측이 닫혀 있으면 경고를 남기고 이벤트를 버립니다.
#[derive(Debug, Clone)]
pub struct ChannelEventBus {
    tx: mpsc::UnboundedSender<LifecycleEvent>,
}

impl ChannelEventBus {
    /// 버스와 수신 측 채널을 함께 생성합니다.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// 기존 송신 측으로 버스를 생성합니다.
    pub fn from_sender(tx: mpsc::UnboundedSender<LifecycleEvent>) -> Self {
        Self { tx }
    }

    /// 수신 측이 닫혔는지 여부
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl EventBus for ChannelEventBus {
    fn publish(&self, event: LifecycleEvent) {
        if let Err(mpsc::error::SendError(event)) = self.tx.send(event) {
            warn!(
                event_type = event.event_type(),
                case_id = event.identity().case_id.as_str(),
                "event receiver dropped, discarding lifecycle event"
            );
        }
    }
}

// ─── JsonLinesEventBus ───────────────────────────────────────────────

/// 이벤트를 한 줄에 하나씩 JSON으로 기록하는 버스
///
/// 직렬화나 쓰기 실패는 경고만 남기고 무시합니다.
#[derive(Debug)]
pub struct JsonLinesEventBus<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesEventBus<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// 내부 writer를 돌려받습니다.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> EventBus for JsonLinesEventBus<W> {
    fn publish(&self, event: LifecycleEvent) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                warn!(
                    event_type = event.event_type(),
                    error = %e,
                    "failed to serialize lifecycle event"
                );
                return;
            }
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            warn!(
                event_type = event.event_type(),
                error = %e,
                "failed to write lifecycle event"
            );
        }
    }
}
