//! 시뮬레이터 도메인 모델.
//!
//! - `user` - 사용자와 보유 코인
//! - `coin` - 코인, 가격 이력, 기본 코인 카탈로그
//! - `transaction` - 거래 기록과 거래 유형
//! - `pricing` - 가격 충격 및 랜덤 워크 계산
//! - `settlement` - 매수/매도 정산
//! - `events` - 실시간 브로드캐스트 이벤트

pub mod coin;
pub mod events;
pub mod pricing;
pub mod settlement;
pub mod transaction;
pub mod user;

pub use coin::{default_coin_catalog, Coin, PriceHistory, PricePoint, DEFAULT_HISTORY_WINDOW};
pub use events::{EventSink, MarketEvent, NullSink, PriceUpdate};
pub use pricing::{
    clamp_price, draw_change, drifted_price, impacted_price, percent_change,
    DEFAULT_IMPACT_FACTOR, DEFAULT_MAX_TICK_CHANGE, MIN_PRICE,
};
pub use settlement::{settle_trade, Settlement};
pub use transaction::{TradeType, Transaction};
pub use user::{Holdings, User, UserView};
