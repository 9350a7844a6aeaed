//! LedgerStore 통합 테스트
//!
//! 인메모리 저장소는 항상 실행되고, PostgreSQL 저장소 테스트는
//! `DATABASE_URL`이 설정된 환경에서 `--ignored`로 실행합니다.

use std::sync::Arc;

use chrono::Utc;
use coinsim_core::{
    default_coin_catalog, settle_trade, DatabaseConfig, TradeType, User, DEFAULT_IMPACT_FACTOR,
};
use coinsim_store::{LedgerStore, MemoryStore, PgStore, StoreError, TradeCommit};
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn seeded(store: &dyn LedgerStore) -> Uuid {
    store
        .seed_coins(default_coin_catalog(1440, Utc::now()))
        .await
        .unwrap();
    let username = format!("trader-{}", Uuid::new_v4());
    store
        .create_user(User::new(username, "hash", dec!(10000)))
        .await
        .unwrap()
        .value
        .id
}

async fn buy(store: &dyn LedgerStore, user_id: Uuid, symbol: &str, amount: rust_decimal::Decimal) {
    let snapshot = store.load_trade_snapshot(user_id, symbol).await.unwrap();
    let settlement = settle_trade(
        &snapshot.user.value,
        &snapshot.coin.value,
        TradeType::Buy,
        amount,
        DEFAULT_IMPACT_FACTOR,
        Utc::now(),
    )
    .unwrap();
    store
        .commit_trade(TradeCommit {
            user: settlement.user,
            user_version: snapshot.user.version,
            coin: settlement.coin,
            coin_version: snapshot.coin.version,
            transaction: settlement.transaction,
        })
        .await
        .unwrap();
}

async fn commit_bumps_versions_and_appends(store: &dyn LedgerStore) {
    let user_id = seeded(store).await;
    let before = store.load_trade_snapshot(user_id, "CRN").await.unwrap();

    buy(store, user_id, "CRN", dec!(10)).await;

    let after = store.load_trade_snapshot(user_id, "CRN").await.unwrap();
    assert_eq!(after.user.version, before.user.version + 1);
    assert_eq!(after.coin.version, before.coin.version + 1);
    assert_eq!(after.user.value.holdings.quantity("CRN"), dec!(10));

    let txs = store.recent_transactions(user_id, 5).await.unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].coin_symbol, "CRN");
    assert_eq!(txs[0].trade_type, TradeType::Buy);
}

async fn recent_transactions_newest_first(store: &dyn LedgerStore) {
    let user_id = seeded(store).await;
    for symbol in ["CRN", "BLK", "NOVA", "QBT", "LUM", "BLK", "NOVA"] {
        buy(store, user_id, symbol, dec!(1)).await;
    }

    let txs = store.recent_transactions(user_id, 5).await.unwrap();
    let symbols: Vec<_> = txs.iter().map(|t| t.coin_symbol.as_str()).collect();
    assert_eq!(symbols, vec!["NOVA", "BLK", "LUM", "QBT", "NOVA"]);
}

async fn update_coin_rejects_stale_version(store: &dyn LedgerStore) {
    seeded(store).await;
    let coin = store.get_coin("LUM").await.unwrap();

    let mut first = coin.value.clone();
    first.record_tick(dec!(0.9), Utc::now());
    store.update_coin(first, coin.version).await.unwrap();

    let mut second = coin.value.clone();
    second.record_tick(dec!(0.8), Utc::now());
    let err = store.update_coin(second, coin.version).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    assert_eq!(store.get_coin("LUM").await.unwrap().value.price, dec!(0.9));
}

async fn unknown_records(store: &dyn LedgerStore) {
    let user_id = seeded(store).await;

    assert!(matches!(
        store.get_user(Uuid::new_v4()).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.get_coin("DOGE").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.load_trade_snapshot(user_id, "DOGE").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(store
        .find_user_by_username("nobody-here")
        .await
        .unwrap()
        .is_none());
}

// ==================== 인메모리 ====================

#[tokio::test]
async fn memory_commit_bumps_versions_and_appends() {
    commit_bumps_versions_and_appends(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_recent_transactions_newest_first() {
    recent_transactions_newest_first(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_update_coin_rejects_stale_version() {
    update_coin_rejects_stale_version(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_unknown_records() {
    unknown_records(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_concurrent_updates_single_winner_per_version() {
    let store = Arc::new(MemoryStore::new());
    seeded(store.as_ref()).await;
    let coin = store.get_coin("QBT").await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        let coin = coin.clone();
        handles.push(tokio::spawn(async move {
            let mut next = coin.value.clone();
            next.record_tick(dec!(1280) + rust_decimal::Decimal::from(i), Utc::now());
            store.update_coin(next, coin.version).await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(store.get_coin("QBT").await.unwrap().version, coin.version + 1);
}

// ==================== PostgreSQL ====================

async fn pg_store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PgStore::connect(&url, &DatabaseConfig::default()).await.unwrap();
    store.migrate().await.unwrap();
    store
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn postgres_commit_bumps_versions_and_appends() {
    commit_bumps_versions_and_appends(&pg_store().await).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn postgres_recent_transactions_newest_first() {
    recent_transactions_newest_first(&pg_store().await).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn postgres_unknown_records() {
    unknown_records(&pg_store().await).await;
}
