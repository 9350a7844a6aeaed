//! 코인과 가격 이력.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::PriceUpdate;
use super::pricing::{clamp_price, impacted_price, percent_change};
use super::transaction::TradeType;

/// 기본 가격 이력 윈도우 (2초 틱 기준 약 48분).
pub const DEFAULT_HISTORY_WINDOW: usize = 1440;

/// 가격 이력 한 지점.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// 크기가 제한된 가격 이력.
///
/// 윈도우를 넘으면 가장 오래된 항목부터 제거됩니다.
/// 직렬화 시에는 오래된 순서의 배열로 표현됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceHistory {
    points: VecDeque<PricePoint>,
    window: usize,
}

impl PriceHistory {
    pub fn new(window: usize) -> Self {
        Self {
            points: VecDeque::new(),
            window: window.max(1),
        }
    }

    /// 항목을 추가하고 윈도우를 넘는 오래된 항목을 제거합니다.
    pub fn push(&mut self, point: PricePoint) {
        self.points.push_back(point);
        self.evict();
    }

    /// 윈도우 크기를 변경합니다. 줄어든 경우 즉시 제거가 일어납니다.
    pub fn set_window(&mut self, window: usize) {
        self.window = window.max(1);
        self.evict();
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn oldest(&self) -> Option<&PricePoint> {
        self.points.front()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PricePoint> {
        self.points.iter()
    }

    fn evict(&mut self) {
        while self.points.len() > self.window {
            self.points.pop_front();
        }
    }
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

/// 저장된 배열에서 복원할 때는 모든 지점을 보존합니다.
///
/// 윈도우는 `max(len, DEFAULT_HISTORY_WINDOW)`로 잡히며, 실제 윈도우는
/// 시뮬레이터가 [`PriceHistory::set_window`]로 맞춥니다.
impl From<Vec<PricePoint>> for PriceHistory {
    fn from(points: Vec<PricePoint>) -> Self {
        Self {
            window: points.len().max(DEFAULT_HISTORY_WINDOW),
            points: points.into(),
        }
    }
}

impl From<PriceHistory> for Vec<PricePoint> {
    fn from(history: PriceHistory) -> Self {
        history.points.into_iter().collect()
    }
}

/// 시뮬레이션 코인.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    pub id: Uuid,
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
    pub total_supply: Decimal,
    pub price_history: PriceHistory,
    /// 윈도우 내 가장 오래된 가격 대비 변화율 (%)
    pub price_change_24h: Decimal,
}

impl Coin {
    /// 초기 가격 한 건으로 이력을 채운 새 코인을 생성합니다.
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        total_supply: Decimal,
        window: usize,
        at: DateTime<Utc>,
    ) -> Self {
        let price = clamp_price(price);
        let mut price_history = PriceHistory::new(window);
        price_history.push(PricePoint {
            price,
            timestamp: at,
        });

        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            name: name.into(),
            price,
            total_supply,
            price_history,
            price_change_24h: Decimal::ZERO,
        }
    }

    /// 시뮬레이터 틱 적용: 가격 갱신, 이력 추가, 변화율 재계산.
    pub fn record_tick(&mut self, new_price: Decimal, at: DateTime<Utc>) {
        self.price = clamp_price(new_price);
        self.price_history.push(PricePoint {
            price: self.price,
            timestamp: at,
        });
        self.refresh_change_24h();
    }

    /// 거래 가격 충격 적용. 이력에는 추가하지 않습니다.
    pub fn apply_impact(&mut self, trade_type: TradeType, amount: Decimal, factor: Decimal) {
        self.price = impacted_price(self.price, trade_type, amount, factor);
        self.refresh_change_24h();
    }

    /// 현재 이력 윈도우 기준으로 24h 변화율을 다시 계산합니다.
    pub fn refresh_change_24h(&mut self) {
        self.price_change_24h = match self.price_history.oldest() {
            Some(oldest) => percent_change(self.price, oldest.price).round_dp(8),
            None => Decimal::ZERO,
        };
    }

    /// 브로드캐스트용 가격 갱신 페이로드.
    pub fn price_update(&self) -> PriceUpdate {
        PriceUpdate {
            id: self.id,
            symbol: self.symbol.clone(),
            price: self.price,
            price_change_24h: self.price_change_24h,
        }
    }
}

/// 기본 코인 카탈로그.
///
/// 저장소가 비어 있을 때 시작 시 한 번 생성됩니다.
pub fn default_coin_catalog(window: usize, at: DateTime<Utc>) -> Vec<Coin> {
    [
        ("CRN", "Cryptonium", dec!(175), dec!(21000000)),
        ("BLK", "Blockium", dec!(42.5), dec!(100000000)),
        ("NOVA", "Novacoin", dec!(3.2), dec!(500000000)),
        ("QBT", "Qubit", dec!(1280), dec!(5000000)),
        ("LUM", "Lumen", dec!(0.85), dec!(1000000000)),
    ]
    .into_iter()
    .map(|(symbol, name, price, supply)| Coin::new(symbol, name, price, supply, window, at))
    .collect()
}
