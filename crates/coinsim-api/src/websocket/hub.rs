//! 브로드캐스트 허브.
//!
//! `tokio::sync::broadcast` 채널 하나로 모든 세션에 이벤트를 팬아웃합니다.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use coinsim_core::{EventSink, MarketEvent};
use tokio::sync::broadcast;
use tracing::trace;

use crate::metrics::{
    decrement_websocket_connections, increment_websocket_connections, record_broadcast,
};

/// 이벤트 브로드캐스트 허브.
///
/// 복제 비용이 낮으며 모든 복제본이 같은 채널을 공유합니다.
#[derive(Clone)]
pub struct BroadcastHub {
    sender: broadcast::Sender<MarketEvent>,
    sessions: Arc<AtomicUsize>,
}

impl BroadcastHub {
    /// 지정한 버퍼 크기로 허브를 생성합니다.
    ///
    /// 버퍼보다 뒤처진 수신자는 밀린 이벤트를 건너뜁니다.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 새 클라이언트 세션을 등록합니다.
    ///
    /// 반환된 세션이 drop되면 등록이 해제됩니다.
    pub fn connect(&self) -> HubSession {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        increment_websocket_connections();
        HubSession {
            receiver: self.sender.subscribe(),
            sessions: Arc::clone(&self.sessions),
        }
    }

    /// 현재 연결된 WebSocket 세션 수.
    pub fn session_count(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

impl EventSink for BroadcastHub {
    fn publish(&self, event: MarketEvent) -> usize {
        let kind = event.kind();
        // 수신자가 없으면 send가 실패하지만 에러가 아님
        let delivered = self.sender.send(event).unwrap_or(0);
        trace!(kind, delivered, "Event published");
        record_broadcast(kind, delivered);
        delivered
    }
}

/// 등록된 WebSocket 세션.
pub struct HubSession {
    receiver: broadcast::Receiver<MarketEvent>,
    sessions: Arc<AtomicUsize>,
}

impl HubSession {
    /// 다음 이벤트를 기다립니다.
    pub async fn recv(&mut self) -> Result<MarketEvent, broadcast::error::RecvError> {
        self.receiver.recv().await
    }
}

impl Drop for HubSession {
    fn drop(&mut self) {
        self.sessions.fetch_sub(1, Ordering::SeqCst);
        decrement_websocket_connections();
    }
}
