//! 인메모리 원장 저장소.
//!
//! 단일 `RwLock` 아래에 전체 원장을 두며, 커밋은 쓰기 락 하나로
//! 버전 확인과 세 가지 쓰기를 함께 수행합니다.

use std::collections::HashMap;

use async_trait::async_trait;
use coinsim_core::{Coin, Transaction, User};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::ledger::{CommittedTrade, LedgerStore, TradeCommit, TradeSnapshot, Versioned};

#[derive(Debug, Default)]
struct Ledger {
    users: HashMap<Uuid, Versioned<User>>,
    usernames: HashMap<String, Uuid>,
    /// 생성 순서 유지
    coins: Vec<Versioned<Coin>>,
    /// 커밋 순서 (append-only)
    transactions: Vec<Transaction>,
}

impl Ledger {
    fn user(&self, id: Uuid) -> Result<&Versioned<User>> {
        self.users
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    fn coin_index(&self, symbol: &str) -> Result<usize> {
        self.coins
            .iter()
            .position(|c| c.value.symbol == symbol)
            .ok_or_else(|| StoreError::NotFound(format!("coin {}", symbol)))
    }

    fn coin_index_by_id(&self, id: Uuid) -> Result<usize> {
        self.coins
            .iter()
            .position(|c| c.value.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("coin {}", id)))
    }
}

/// 인메모리 저장소.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: RwLock<Ledger>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 전체 거래 수.
    pub async fn transaction_count(&self) -> usize {
        self.ledger.read().await.transactions.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create_user(&self, user: User) -> Result<Versioned<User>> {
        let mut ledger = self.ledger.write().await;
        if ledger.usernames.contains_key(&user.username) {
            return Err(StoreError::Duplicate(format!("username {}", user.username)));
        }

        let stored = Versioned::initial(user);
        ledger
            .usernames
            .insert(stored.value.username.clone(), stored.value.id);
        ledger.users.insert(stored.value.id, stored.clone());

        debug!(user_id = %stored.value.id, "User created");
        Ok(stored)
    }

    async fn get_user(&self, id: Uuid) -> Result<Versioned<User>> {
        self.ledger.read().await.user(id).cloned()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<Versioned<User>>> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .usernames
            .get(username)
            .and_then(|id| ledger.users.get(id))
            .cloned())
    }

    async fn seed_coins(&self, coins: Vec<Coin>) -> Result<usize> {
        let mut ledger = self.ledger.write().await;
        let mut inserted = 0;
        for coin in coins {
            if ledger.coins.iter().any(|c| c.value.symbol == coin.symbol) {
                continue;
            }
            ledger.coins.push(Versioned::initial(coin));
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn list_coins(&self) -> Result<Vec<Versioned<Coin>>> {
        Ok(self.ledger.read().await.coins.clone())
    }

    async fn get_coin(&self, symbol: &str) -> Result<Versioned<Coin>> {
        let ledger = self.ledger.read().await;
        let idx = ledger.coin_index(symbol)?;
        Ok(ledger.coins[idx].clone())
    }

    async fn load_trade_snapshot(&self, user_id: Uuid, symbol: &str) -> Result<TradeSnapshot> {
        let ledger = self.ledger.read().await;
        let user = ledger.user(user_id)?.clone();
        let idx = ledger.coin_index(symbol)?;
        Ok(TradeSnapshot {
            user,
            coin: ledger.coins[idx].clone(),
        })
    }

    async fn commit_trade(&self, commit: TradeCommit) -> Result<CommittedTrade> {
        let mut ledger = self.ledger.write().await;

        let current_user_version = ledger.user(commit.user.id)?.version;
        if current_user_version != commit.user_version {
            return Err(StoreError::Conflict(format!(
                "user {} at version {}, expected {}",
                commit.user.id, current_user_version, commit.user_version
            )));
        }

        let coin_idx = ledger.coin_index_by_id(commit.coin.id)?;
        let current_coin_version = ledger.coins[coin_idx].version;
        if current_coin_version != commit.coin_version {
            return Err(StoreError::Conflict(format!(
                "coin {} at version {}, expected {}",
                commit.coin.symbol, current_coin_version, commit.coin_version
            )));
        }

        // 검증 이후에는 실패 경로가 없으므로 세 쓰기가 함께 적용됩니다.
        let user = Versioned::new(commit.user, current_user_version + 1);
        let coin = Versioned::new(commit.coin, current_coin_version + 1);
        ledger.users.insert(user.value.id, user.clone());
        ledger.coins[coin_idx] = coin.clone();
        ledger.transactions.push(commit.transaction);

        Ok(CommittedTrade { user, coin })
    }

    async fn update_coin(&self, coin: Coin, expected_version: i64) -> Result<Versioned<Coin>> {
        let mut ledger = self.ledger.write().await;
        let idx = ledger.coin_index_by_id(coin.id)?;
        let current = ledger.coins[idx].version;
        if current != expected_version {
            return Err(StoreError::Conflict(format!(
                "coin {} at version {}, expected {}",
                coin.symbol, current, expected_version
            )));
        }

        let stored = Versioned::new(coin, current + 1);
        ledger.coins[idx] = stored.clone();
        Ok(stored)
    }

    async fn recent_transactions(&self, user_id: Uuid, limit: usize) -> Result<Vec<Transaction>> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .transactions
            .iter()
            .rev()
            .filter(|tx| tx.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use coinsim_core::{default_coin_catalog, TradeType};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryStore::new();
        let now = Utc::now();

        assert_eq!(store.seed_coins(default_coin_catalog(1440, now)).await.unwrap(), 5);
        assert_eq!(store.seed_coins(default_coin_catalog(1440, now)).await.unwrap(), 0);
        assert_eq!(store.list_coins().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let store = MemoryStore::new();
        store
            .create_user(User::new("alice", "h", dec!(10000)))
            .await
            .unwrap();

        let err = store
            .create_user(User::new("alice", "h2", dec!(10000)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_stale_commit_writes_nothing() {
        let store = MemoryStore::new();
        store
            .seed_coins(default_coin_catalog(1440, Utc::now()))
            .await
            .unwrap();
        let user = store
            .create_user(User::new("bob", "h", dec!(10000)))
            .await
            .unwrap();
        let snapshot = store.load_trade_snapshot(user.value.id, "CRN").await.unwrap();

        // 다른 쓰기가 코인 버전을 올림
        store
            .update_coin(snapshot.coin.value.clone(), snapshot.coin.version)
            .await
            .unwrap();

        let mut next_user = snapshot.user.value.clone();
        next_user.balance = dec!(1);
        let tx = Transaction::new(
            user.value.id,
            snapshot.coin.value.id,
            "CRN",
            TradeType::Buy,
            dec!(1),
            dec!(175),
            Utc::now(),
        );
        let err = store
            .commit_trade(TradeCommit {
                user: next_user,
                user_version: snapshot.user.version,
                coin: snapshot.coin.value.clone(),
                coin_version: snapshot.coin.version,
                transaction: tx,
            })
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(store.get_user(user.value.id).await.unwrap().value.balance, dec!(10000));
        assert_eq!(store.transaction_count().await, 0);
    }
}
