//! 원장 저장소 인터페이스.
//!
//! 사용자/코인 문서는 버전을 가지며, 모든 쓰기는 읽을 때 관찰한 버전과
//! 저장된 버전이 같을 때만 적용됩니다 (compare-and-swap).

use async_trait::async_trait;
use coinsim_core::{Coin, Transaction, User};
use uuid::Uuid;

use crate::error::Result;

/// 버전이 붙은 문서.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    /// 커밋마다 1씩 증가하는 버전
    pub version: i64,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: i64) -> Self {
        Self { value, version }
    }

    /// 최초 저장 시 버전.
    pub fn initial(value: T) -> Self {
        Self::new(value, 1)
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// 거래 계산에 사용하는 일관된 사용자/코인 스냅샷.
#[derive(Debug, Clone)]
pub struct TradeSnapshot {
    pub user: Versioned<User>,
    pub coin: Versioned<Coin>,
}

/// 원자적으로 커밋할 거래 결과.
#[derive(Debug, Clone)]
pub struct TradeCommit {
    pub user: User,
    /// 스냅샷 시점의 사용자 버전
    pub user_version: i64,
    pub coin: Coin,
    /// 스냅샷 시점의 코인 버전
    pub coin_version: i64,
    pub transaction: Transaction,
}

/// 커밋 후 저장된 사용자/코인.
#[derive(Debug, Clone)]
pub struct CommittedTrade {
    pub user: Versioned<User>,
    pub coin: Versioned<Coin>,
}

/// 원장 저장소.
///
/// 구현체는 `commit_trade`를 원자적으로 처리해야 합니다.
/// 사용자 갱신, 코인 갱신, 거래 기록 추가가 모두 적용되거나 모두 적용되지 않습니다.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// 백엔드 이름 (헬스 체크/로그용).
    fn backend(&self) -> &'static str;

    /// 사용자를 생성합니다. 사용자명이 이미 있으면 `Duplicate`.
    async fn create_user(&self, user: User) -> Result<Versioned<User>>;

    /// ID로 사용자를 조회합니다.
    async fn get_user(&self, id: Uuid) -> Result<Versioned<User>>;

    /// 사용자명으로 사용자를 조회합니다.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<Versioned<User>>>;

    /// 심볼이 없는 코인만 추가하고 추가된 개수를 반환합니다.
    async fn seed_coins(&self, coins: Vec<Coin>) -> Result<usize>;

    /// 모든 코인을 생성 순서대로 반환합니다.
    async fn list_coins(&self) -> Result<Vec<Versioned<Coin>>>;

    /// 심볼로 코인을 조회합니다.
    async fn get_coin(&self, symbol: &str) -> Result<Versioned<Coin>>;

    /// 사용자와 코인을 하나의 일관된 스냅샷으로 읽습니다.
    async fn load_trade_snapshot(&self, user_id: Uuid, symbol: &str) -> Result<TradeSnapshot>;

    /// 거래 결과를 원자적으로 커밋합니다.
    ///
    /// 사용자나 코인의 버전이 스냅샷 이후 바뀌었다면 아무것도 쓰지 않고 `Conflict`.
    async fn commit_trade(&self, commit: TradeCommit) -> Result<CommittedTrade>;

    /// 코인 문서를 갱신합니다. 버전이 다르면 `Conflict`.
    async fn update_coin(&self, coin: Coin, expected_version: i64) -> Result<Versioned<Coin>>;

    /// 사용자의 최근 거래를 최신순으로 반환합니다.
    async fn recent_transactions(&self, user_id: Uuid, limit: usize) -> Result<Vec<Transaction>>;

    /// 저장소 상태를 확인합니다.
    async fn health_check(&self) -> Result<()>;
}
