//! 엔진 통합 테스트 공용 도구

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use coinsim_core::{Coin, EventSink, MarketEvent, TradeType, Transaction, User};
use coinsim_engine::seed_default_coins;
use coinsim_store::{
    CommittedTrade, LedgerStore, MemoryStore, Result, StoreError, TradeCommit, TradeSnapshot,
    Versioned,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// 발행된 이벤트를 기록하는 싱크.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MarketEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<MarketEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind() == kind)
            .count()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: MarketEvent) -> usize {
        self.events.lock().unwrap().push(event);
        1
    }
}

/// 주입할 장애 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    /// commit_trade가 항상 버전 충돌
    AlwaysConflict,
    /// commit_trade가 항상 쿼리 오류
    CommitFails,
    /// 특정 심볼의 update_coin이 항상 실패
    UpdateFailsFor(&'static str),
    /// 특정 심볼의 첫 update_coin 직전에 대량 매수 충격이 끼어듦
    ImpactBeforeUpdateOnce(&'static str),
}

/// 장애 주입이 가능한 인메모리 저장소 래퍼.
pub struct FaultyStore {
    inner: MemoryStore,
    fault: Fault,
    commit_calls: AtomicUsize,
    interleaved: AtomicBool,
}

impl FaultyStore {
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: MemoryStore::new(),
            fault,
            commit_calls: AtomicUsize::new(0),
            interleaved: AtomicBool::new(false),
        }
    }

    pub fn commit_calls(&self) -> usize {
        self.commit_calls.load(Ordering::SeqCst)
    }

    pub async fn transaction_count(&self) -> usize {
        self.inner.transaction_count().await
    }
}

#[async_trait]
impl LedgerStore for FaultyStore {
    fn backend(&self) -> &'static str {
        "faulty"
    }

    async fn create_user(&self, user: User) -> Result<Versioned<User>> {
        self.inner.create_user(user).await
    }

    async fn get_user(&self, id: Uuid) -> Result<Versioned<User>> {
        self.inner.get_user(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<Versioned<User>>> {
        self.inner.find_user_by_username(username).await
    }

    async fn seed_coins(&self, coins: Vec<Coin>) -> Result<usize> {
        self.inner.seed_coins(coins).await
    }

    async fn list_coins(&self) -> Result<Vec<Versioned<Coin>>> {
        self.inner.list_coins().await
    }

    async fn get_coin(&self, symbol: &str) -> Result<Versioned<Coin>> {
        self.inner.get_coin(symbol).await
    }

    async fn load_trade_snapshot(&self, user_id: Uuid, symbol: &str) -> Result<TradeSnapshot> {
        self.inner.load_trade_snapshot(user_id, symbol).await
    }

    async fn commit_trade(&self, commit: TradeCommit) -> Result<CommittedTrade> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        match self.fault {
            Fault::AlwaysConflict => Err(StoreError::Conflict("injected".to_string())),
            Fault::CommitFails => Err(StoreError::Query("injected".to_string())),
            _ => self.inner.commit_trade(commit).await,
        }
    }

    async fn update_coin(&self, coin: Coin, expected_version: i64) -> Result<Versioned<Coin>> {
        match self.fault {
            Fault::UpdateFailsFor(symbol) if coin.symbol == symbol => {
                Err(StoreError::Query("injected".to_string()))
            }
            Fault::ImpactBeforeUpdateOnce(symbol)
                if coin.symbol == symbol && !self.interleaved.swap(true, Ordering::SeqCst) =>
            {
                // 동시에 커밋된 거래를 흉내: 가격이 두 배가 된 뒤 버전이 올라감
                let current = self.inner.get_coin(symbol).await?;
                let mut impacted = current.value;
                impacted.apply_impact(TradeType::Buy, dec!(100000), dec!(0.00001));
                self.inner.update_coin(impacted, current.version).await?;
                self.inner.update_coin(coin, expected_version).await
            }
            _ => self.inner.update_coin(coin, expected_version).await,
        }
    }

    async fn recent_transactions(&self, user_id: Uuid, limit: usize) -> Result<Vec<Transaction>> {
        self.inner.recent_transactions(user_id, limit).await
    }

    async fn health_check(&self) -> Result<()> {
        self.inner.health_check().await
    }
}

/// 기본 코인과 시작 잔고를 가진 사용자 한 명이 있는 저장소를 준비합니다.
pub async fn seeded_user<S: LedgerStore>(store: &S, balance: Decimal) -> Uuid {
    seed_default_coins(store, 1440).await.unwrap();
    store
        .create_user(User::new(format!("user-{}", Uuid::new_v4()), "hash", balance))
        .await
        .unwrap()
        .value
        .id
}
