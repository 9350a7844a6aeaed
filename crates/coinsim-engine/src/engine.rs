//! 트랜잭션 엔진.
//!
//! 사용자/코인 스냅샷을 읽고, 정산을 계산한 뒤, 읽은 버전을 조건으로
//! 원자적으로 커밋합니다. 버전 충돌 시 다시 읽고 다시 계산합니다.

use std::sync::Arc;

use chrono::Utc;
use coinsim_core::{
    settle_trade, Coin, EventSink, MarketEvent, TradeError, TradeType, TradingConfig, Transaction,
    User,
};
use coinsim_store::{LedgerStore, StoreError, TradeCommit};
use metrics::counter;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// 체결 결과.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    /// 갱신된 사용자
    pub user: User,
    /// 가격 충격이 반영된 코인
    pub coin: Coin,
    pub transaction: Transaction,
    /// 커밋까지 시도한 횟수
    pub attempts: u32,
}

/// 거래 유형 문자열을 파싱합니다.
pub fn parse_trade_type(raw: &str) -> EngineResult<TradeType> {
    raw.parse()
        .map_err(|_| EngineError::InvalidType(raw.to_string()))
}

/// 트랜잭션 엔진.
pub struct TransactionEngine {
    store: Arc<dyn LedgerStore>,
    events: Arc<dyn EventSink>,
    config: TradingConfig,
}

impl TransactionEngine {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        events: Arc<dyn EventSink>,
        config: TradingConfig,
    ) -> Self {
        Self {
            store,
            events,
            config,
        }
    }

    /// 매수/매도를 실행합니다.
    ///
    /// 성공 시 가격/사용자 이벤트를 발행하고 갱신된 사용자를 반환합니다.
    /// 실패 시 저장소에는 아무것도 기록되지 않습니다.
    ///
    /// # Arguments
    /// * `user_id` - 거래 사용자
    /// * `symbol` - 코인 심볼
    /// * `trade_type` - 매수/매도
    /// * `amount` - 거래 수량
    #[instrument(
        skip_all,
        fields(user_id = %user_id, symbol = %symbol, trade_type = %trade_type, amount = %amount)
    )]
    pub async fn execute(
        &self,
        user_id: Uuid,
        symbol: &str,
        trade_type: TradeType,
        amount: Decimal,
    ) -> EngineResult<TradeOutcome> {
        let result = self.execute_inner(user_id, symbol, trade_type, amount).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        counter!("coinsim_trades_total", "type" => trade_type.as_str(), "outcome" => outcome)
            .increment(1);

        match &result {
            Ok(done) => {
                info!(
                    price = %done.transaction.price,
                    new_price = %done.coin.price,
                    attempts = done.attempts,
                    "Trade executed"
                );
                self.events
                    .publish(MarketEvent::PriceUpdate(done.coin.price_update()));
                self.events.publish(MarketEvent::UserUpdate(done.user.view()));
            }
            Err(EngineError::Store(e)) => warn!(error = %e, "Trade failed on store error"),
            Err(e) => debug!(error = %e, "Trade rejected"),
        }

        result
    }

    async fn execute_inner(
        &self,
        user_id: Uuid,
        symbol: &str,
        trade_type: TradeType,
        amount: Decimal,
    ) -> EngineResult<TradeOutcome> {
        if amount <= Decimal::ZERO {
            return Err(TradeError::InvalidAmount.into());
        }

        let max_attempts = self.config.max_commit_retries.max(1);
        for attempt in 1..=max_attempts {
            let snapshot = match self.store.load_trade_snapshot(user_id, symbol).await {
                Ok(snapshot) => snapshot,
                Err(StoreError::NotFound(_)) => return Err(self.missing(user_id, symbol).await),
                Err(e) => return Err(e.into()),
            };

            let settlement = settle_trade(
                &snapshot.user.value,
                &snapshot.coin.value,
                trade_type,
                amount,
                self.config.price_impact_factor,
                Utc::now(),
            )?;

            let commit = TradeCommit {
                user: settlement.user,
                user_version: snapshot.user.version,
                coin: settlement.coin,
                coin_version: snapshot.coin.version,
                transaction: settlement.transaction.clone(),
            };

            match self.store.commit_trade(commit).await {
                Ok(committed) => {
                    return Ok(TradeOutcome {
                        user: committed.user.value,
                        coin: committed.coin.value,
                        transaction: settlement.transaction,
                        attempts: attempt,
                    });
                }
                Err(e) if e.is_conflict() => {
                    debug!(attempt, error = %e, "Version conflict, reloading snapshot");
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(EngineError::Contention {
            attempts: max_attempts,
        })
    }

    /// 스냅샷 조회 실패 시 사용자/코인 중 어느 쪽이 없는지 판별합니다.
    async fn missing(&self, user_id: Uuid, symbol: &str) -> EngineError {
        match self.store.get_coin(symbol).await {
            Err(StoreError::NotFound(_)) => EngineError::CoinNotFound(symbol.to_string()),
            Err(e) => EngineError::Store(e),
            Ok(_) => EngineError::UserNotFound(user_id),
        }
    }
}
