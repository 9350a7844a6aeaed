//! 거래 기록.
//!
//! 거래 기록은 성공한 매수/매도에 의해서만 생성되며 이후 변경되지 않습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 거래 유형 (매수 또는 매도).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl TradeType {
    /// 저장소/메트릭 라벨용 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "buy",
            TradeType::Sell => "sell",
        }
    }
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TradeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(TradeType::Buy),
            "sell" => Ok(TradeType::Sell),
            other => Err(format!("Invalid transaction type: {}", other)),
        }
    }
}

/// 체결된 거래 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// 거래 ID
    pub id: Uuid,
    /// 사용자 ID
    pub user_id: Uuid,
    /// 코인 ID
    pub coin_id: Uuid,
    /// 코인 심볼
    pub coin_symbol: String,
    /// 거래 유형
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    /// 수량
    pub amount: Decimal,
    /// 체결 가격 (가격 충격 적용 전)
    pub price: Decimal,
    /// 체결 시각
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// 새 거래 기록을 생성합니다.
    pub fn new(
        user_id: Uuid,
        coin_id: Uuid,
        coin_symbol: impl Into<String>,
        trade_type: TradeType,
        amount: Decimal,
        price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            coin_id,
            coin_symbol: coin_symbol.into(),
            trade_type,
            amount,
            price,
            timestamp,
        }
    }

    /// 거래 총액 (수량 × 체결가).
    pub fn total(&self) -> Decimal {
        self.amount * self.price
    }
}
