//! 실시간 이벤트 스트리밍을 위한 WebSocket 서버.
//!
//! 연결된 모든 클라이언트에게 같은 이벤트를 전달합니다 (사용자별 필터링 없음,
//! 재전송 없음). 클라이언트 → 서버 메시지는 프로토콜에 포함되지 않습니다.
//!
//! # 서버 → 클라이언트
//!
//! ```json
//! {"type": "priceUpdate", "data": {"id": "...", "symbol": "CRN", "price": "175.0175", "priceChange24h": "0.01"}}
//! {"type": "userUpdate", "data": {"id": "...", "username": "alice", "balance": "8250", "holdings": {"CRN": "10"}}}
//! ```

pub mod handler;
pub mod hub;

pub use handler::{websocket_handler, websocket_router};
pub use hub::{BroadcastHub, HubSession};
