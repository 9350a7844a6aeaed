//! 실시간 브로드캐스트 이벤트.
//!
//! 엔진과 시뮬레이터는 [`EventSink`]를 통해 이벤트를 발행하며,
//! 실제 전달(WebSocket 팬아웃)은 API 계층이 구현합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserView;

/// 코인 가격 갱신 페이로드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub id: Uuid,
    pub symbol: String,
    pub price: Decimal,
    pub price_change_24h: Decimal,
}

/// 연결된 모든 클라이언트에 전달되는 이벤트.
///
/// 와이어 포맷: `{"type":"priceUpdate","data":{...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum MarketEvent {
    /// 코인 가격 변경
    PriceUpdate(PriceUpdate),
    /// 사용자 잔고/보유 변경
    UserUpdate(UserView),
}

impl MarketEvent {
    /// 메트릭/로그용 이벤트 종류.
    pub fn kind(&self) -> &'static str {
        match self {
            MarketEvent::PriceUpdate(_) => "priceUpdate",
            MarketEvent::UserUpdate(_) => "userUpdate",
        }
    }

    /// JSON 텍스트로 직렬화합니다.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// 이벤트 발행 인터페이스.
///
/// 발행은 fire-and-forget이며 구독자가 없어도 에러가 아닙니다.
/// 반환값은 이벤트를 받은 구독자 수입니다.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: MarketEvent) -> usize;
}

/// 이벤트를 버리는 싱크.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: MarketEvent) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::Holdings;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_update_wire_format() {
        let event = MarketEvent::PriceUpdate(PriceUpdate {
            id: Uuid::nil(),
            symbol: "CRN".to_string(),
            price: dec!(175.0175),
            price_change_24h: dec!(0.01),
        });

        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "priceUpdate");
        assert_eq!(json["data"]["symbol"], "CRN");
        assert_eq!(json["data"]["price"], "175.0175");
        assert_eq!(json["data"]["priceChange24h"], "0.01");
    }

    #[test]
    fn test_user_update_wire_format() {
        let event = MarketEvent::UserUpdate(UserView {
            id: Uuid::nil(),
            username: "alice".to_string(),
            balance: dec!(8250),
            holdings: [("CRN".to_string(), dec!(10))].into_iter().collect::<Holdings>(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "userUpdate");
        assert_eq!(json["data"]["username"], "alice");
        assert_eq!(json["data"]["holdings"]["CRN"], "10");
        assert_eq!(event.kind(), "userUpdate");
    }

    #[test]
    fn test_null_sink_reports_no_receivers() {
        let sink = NullSink;
        let event = MarketEvent::UserUpdate(UserView {
            id: Uuid::nil(),
            username: "bob".to_string(),
            balance: Decimal::ZERO,
            holdings: Holdings::new(),
        });
        assert_eq!(sink.publish(event), 0);
    }
}
