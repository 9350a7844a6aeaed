//! 거래 실행 및 가격 시뮬레이션.
//!
//! 이 crate는 다음을 제공합니다:
//! - 낙관적 동시성 제어 기반 트랜잭션 엔진 (매수/매도)
//! - 주기적 랜덤 워크 가격 시뮬레이터
//! - 기본 코인 카탈로그 초기화

pub mod engine;
pub mod error;
pub mod simulator;

pub use engine::{parse_trade_type, TradeOutcome, TransactionEngine};
pub use error::{EngineError, EngineResult};
pub use simulator::{PriceSimulator, TickReport};

use chrono::Utc;
use coinsim_core::default_coin_catalog;
use coinsim_store::{LedgerStore, StoreError};
use tracing::info;

/// 저장소에 없는 기본 코인을 추가합니다.
///
/// 이미 존재하는 심볼은 건드리지 않으므로 재시작 시에도 안전합니다.
pub async fn seed_default_coins(
    store: &dyn LedgerStore,
    history_window: usize,
) -> Result<usize, StoreError> {
    let inserted = store
        .seed_coins(default_coin_catalog(history_window, Utc::now()))
        .await?;
    if inserted > 0 {
        info!(inserted, "Seeded default coin catalog");
    }
    Ok(inserted)
}
