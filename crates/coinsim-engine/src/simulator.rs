//! 가격 시뮬레이터.
//!
//! 주기적으로 모든 코인 가격에 균등 분포 랜덤 워크를 적용하고,
//! 가격 이력을 갱신한 뒤 가격 이벤트를 발행합니다.

use std::sync::Arc;

use chrono::Utc;
use coinsim_core::{draw_change, drifted_price, Coin, EventSink, MarketEvent, SimulatorConfig};
use coinsim_store::{LedgerStore, Versioned};
use metrics::counter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};

/// 한 번의 틱 결과.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 갱신된 코인 수
    pub updated: usize,
    /// 실패한 코인 심볼
    pub failed: Vec<String>,
}

/// 가격 시뮬레이터.
pub struct PriceSimulator {
    store: Arc<dyn LedgerStore>,
    events: Arc<dyn EventSink>,
    config: SimulatorConfig,
    rng: StdRng,
}

impl PriceSimulator {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        events: Arc<dyn EventSink>,
        config: SimulatorConfig,
    ) -> Self {
        Self::with_rng(store, events, config, StdRng::from_entropy())
    }

    /// 난수 생성기를 지정하여 생성합니다 (테스트용 시드 고정).
    pub fn with_rng(
        store: Arc<dyn LedgerStore>,
        events: Arc<dyn EventSink>,
        config: SimulatorConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            events,
            config,
            rng,
        }
    }

    /// 한 번의 틱을 실행합니다.
    ///
    /// 코인별 실패는 로그로 남기고 나머지 코인 처리를 계속합니다.
    pub async fn tick(&mut self) -> TickReport {
        counter!("coinsim_simulator_ticks_total").increment(1);
        let mut report = TickReport::default();

        let coins = match self.store.list_coins().await {
            Ok(coins) => coins,
            Err(e) => {
                warn!(error = %e, "Failed to load coins for price tick");
                return report;
            }
        };

        for coin in coins {
            let symbol = coin.value.symbol.clone();
            match self.advance(coin).await {
                Ok(saved) => {
                    debug!(
                        symbol = %symbol,
                        price = %saved.value.price,
                        change_24h = %saved.value.price_change_24h,
                        "Price updated"
                    );
                    self.events
                        .publish(MarketEvent::PriceUpdate(saved.value.price_update()));
                    report.updated += 1;
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Price update failed, skipping coin");
                    counter!("coinsim_simulator_coin_errors_total", "symbol" => symbol.clone())
                        .increment(1);
                    report.failed.push(symbol);
                }
            }
        }

        report
    }

    /// 코인 하나에 랜덤 워크를 적용하고 저장합니다.
    ///
    /// 버전 충돌 시 최신 코인을 다시 읽어 같은 변동률을 적용합니다.
    async fn advance(&mut self, coin: Versioned<Coin>) -> EngineResult<Versioned<Coin>> {
        let change = draw_change(&mut self.rng, self.config.max_tick_change);
        let max_attempts = self.config.max_update_retries.max(1);
        let mut current = coin;

        for attempt in 1..=max_attempts {
            let next = self.drifted(&current.value, change);
            match self.store.update_coin(next, current.version).await {
                Ok(saved) => return Ok(saved),
                Err(e) if e.is_conflict() => {
                    debug!(symbol = %current.value.symbol, attempt, "Coin changed during tick, reloading");
                    current = self.store.get_coin(&current.value.symbol).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(EngineError::Contention {
            attempts: max_attempts,
        })
    }

    fn drifted(&self, coin: &Coin, change: Decimal) -> Coin {
        let mut next = coin.clone();
        if next.price_history.window() != self.config.history_window {
            next.price_history.set_window(self.config.history_window);
        }
        next.record_tick(drifted_price(coin.price, change), Utc::now());
        next
    }

    /// 종료 토큰이 취소될 때까지 주기적으로 틱을 실행합니다.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let period = self.config.tick_interval();
        info!(interval_ms = period.as_millis() as u64, "Price simulator started");

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // 첫 틱은 즉시 완료되므로 건너뜀
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    if !report.failed.is_empty() {
                        debug!(failed = ?report.failed, "Tick completed with failures");
                    }
                }
            }
        }

        info!("Price simulator stopped");
    }

    /// 백그라운드 태스크로 시뮬레이터를 시작합니다.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
