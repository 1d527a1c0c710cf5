//! 이벤트 버스 — 프로세스 전역 publish/subscribe
//!
//! 파이프라인을 시작한 호출자는 단발성 완료 채널로 결과를 받지만,
//! 같은 호출 스택을 공유하지 않는 프레젠테이션/업로드 협력자는 이 버스를
//! 구독합니다. 두 메커니즘은 소비자와 전달 횟수가 다르므로 하나로
//! 합치지 않습니다.

use tokio::sync::broadcast;
use tracing::debug;

use crate::event::CatalogReadyEvent;

/// 기본 버스 용량
pub const DEFAULT_BUS_CAPACITY: usize = 16;

/// broadcast 기반 이벤트 버스
///
/// `Clone`으로 발행자/구독자 어디로든 전달할 수 있습니다. 구독자가
/// 없을 때의 발행은 조용히 버려집니다 (에러 아님).
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CatalogReadyEvent>,
}

impl EventBus {
    /// 지정한 용량으로 버스를 생성합니다.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 이벤트를 발행하고 수신한 구독자 수를 반환합니다.
    pub fn publish(&self, event: CatalogReadyEvent) -> usize {
        metrics::counter!(crate::metrics::BUS_EVENTS_PUBLISHED_TOTAL).increment(1);
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("event published with no subscribers");
                0
            }
        }
    }

    /// 새 구독을 생성합니다.
    ///
    /// 구독 이후 발행된 이벤트만 수신합니다.
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogReadyEvent> {
        self.tx.subscribe()
    }

    /// 현재 구독자 수를 반환합니다.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}
