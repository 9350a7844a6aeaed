//! PostgreSQL 원장 저장소.
//!
//! 보유 코인과 가격 이력은 JSONB 문서로 저장합니다.
//! 거래 커밋은 하나의 SQL 트랜잭션 안에서 두 문서의 버전 조건부 UPDATE와
//! 거래 기록 INSERT를 수행하며, 조건이 맞지 않으면 롤백합니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coinsim_core::{Coin, DatabaseConfig, Holdings, PriceHistory, Transaction, User};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::ledger::{CommittedTrade, LedgerStore, TradeCommit, TradeSnapshot, Versioned};

const USER_COLUMNS: &str = "id, username, password_hash, balance, holdings, created_at, version";
const COIN_COLUMNS: &str =
    "id, symbol, name, price, total_supply, price_history, price_change_24h, version";

// ==================== 레코드 ====================

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    password_hash: String,
    balance: Decimal,
    holdings: Json<Holdings>,
    created_at: DateTime<Utc>,
    version: i64,
}

impl From<UserRecord> for Versioned<User> {
    fn from(r: UserRecord) -> Self {
        Versioned::new(
            User {
                id: r.id,
                username: r.username,
                password_hash: r.password_hash,
                balance: r.balance,
                holdings: r.holdings.0,
                created_at: r.created_at,
            },
            r.version,
        )
    }
}

#[derive(Debug, FromRow)]
struct CoinRecord {
    id: Uuid,
    symbol: String,
    name: String,
    price: Decimal,
    total_supply: Decimal,
    price_history: Json<PriceHistory>,
    price_change_24h: Decimal,
    version: i64,
}

impl From<CoinRecord> for Versioned<Coin> {
    fn from(r: CoinRecord) -> Self {
        Versioned::new(
            Coin {
                id: r.id,
                symbol: r.symbol,
                name: r.name,
                price: r.price,
                total_supply: r.total_supply,
                price_history: r.price_history.0,
                price_change_24h: r.price_change_24h,
            },
            r.version,
        )
    }
}

#[derive(Debug, FromRow)]
struct TransactionRecord {
    id: Uuid,
    user_id: Uuid,
    coin_id: Uuid,
    coin_symbol: String,
    trade_type: String,
    amount: Decimal,
    price: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = StoreError;

    fn try_from(r: TransactionRecord) -> Result<Self> {
        Ok(Transaction {
            id: r.id,
            user_id: r.user_id,
            coin_id: r.coin_id,
            coin_symbol: r.coin_symbol,
            trade_type: r.trade_type.parse().map_err(StoreError::Serialization)?,
            amount: r.amount,
            price: r.price,
            timestamp: r.created_at,
        })
    }
}

// ==================== 저장소 ====================

/// PostgreSQL 저장소.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// 연결 풀을 생성합니다.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!("Database connection established");
        Ok(Self { pool })
    }

    /// 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: User) -> Result<Versioned<User>> {
        let record: UserRecord = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (id, username, password_hash, balance, holdings, created_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, 1)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.balance)
        .bind(Json(&user.holdings))
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Duplicate(_) => StoreError::Duplicate(format!("username {}", user.username)),
            other => other,
        })?;

        debug!(user_id = %record.id, "User created");
        Ok(record.into())
    }

    async fn get_user(&self, id: Uuid) -> Result<Versioned<User>> {
        let record: Option<UserRecord> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        record
            .map(Into::into)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<Versioned<User>>> {
        let record: Option<UserRecord> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        Ok(record.map(Into::into))
    }

    async fn seed_coins(&self, coins: Vec<Coin>) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for coin in &coins {
            let result = sqlx::query(
                r#"
                INSERT INTO coins (id, symbol, name, price, total_supply, price_history, price_change_24h, version)
                VALUES ($1, $2, $3, $4, $5, $6, $7, 1)
                ON CONFLICT (symbol) DO NOTHING
                "#,
            )
            .bind(coin.id)
            .bind(&coin.symbol)
            .bind(&coin.name)
            .bind(coin.price)
            .bind(coin.total_supply)
            .bind(Json(&coin.price_history))
            .bind(coin.price_change_24h)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn list_coins(&self) -> Result<Vec<Versioned<Coin>>> {
        let records: Vec<CoinRecord> =
            sqlx::query_as(&format!("SELECT {COIN_COLUMNS} FROM coins ORDER BY seq"))
                .fetch_all(&self.pool)
                .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    async fn get_coin(&self, symbol: &str) -> Result<Versioned<Coin>> {
        let record: Option<CoinRecord> =
            sqlx::query_as(&format!("SELECT {COIN_COLUMNS} FROM coins WHERE symbol = $1"))
                .bind(symbol)
                .fetch_optional(&self.pool)
                .await?;

        record
            .map(Into::into)
            .ok_or_else(|| StoreError::NotFound(format!("coin {}", symbol)))
    }

    async fn load_trade_snapshot(&self, user_id: Uuid, symbol: &str) -> Result<TradeSnapshot> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let user: Option<UserRecord> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        let coin: Option<CoinRecord> =
            sqlx::query_as(&format!("SELECT {COIN_COLUMNS} FROM coins WHERE symbol = $1"))
                .bind(symbol)
                .fetch_optional(&mut *tx)
                .await?;

        tx.commit().await?;

        let user = user.ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))?;
        let coin = coin.ok_or_else(|| StoreError::NotFound(format!("coin {}", symbol)))?;
        Ok(TradeSnapshot {
            user: user.into(),
            coin: coin.into(),
        })
    }

    #[instrument(skip(self, commit), fields(user_id = %commit.user.id, symbol = %commit.coin.symbol))]
    async fn commit_trade(&self, commit: TradeCommit) -> Result<CommittedTrade> {
        let mut tx = self.pool.begin().await?;

        let user: Option<UserRecord> = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET balance = $1, holdings = $2, version = version + 1
            WHERE id = $3 AND version = $4
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(commit.user.balance)
        .bind(Json(&commit.user.holdings))
        .bind(commit.user.id)
        .bind(commit.user_version)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user) = user else {
            tx.rollback().await?;
            return Err(StoreError::Conflict(format!(
                "user {} changed since version {}",
                commit.user.id, commit.user_version
            )));
        };

        let coin: Option<CoinRecord> = sqlx::query_as(&format!(
            r#"
            UPDATE coins
            SET price = $1, price_history = $2, price_change_24h = $3,
                version = version + 1, updated_at = NOW()
            WHERE id = $4 AND version = $5
            RETURNING {COIN_COLUMNS}
            "#
        ))
        .bind(commit.coin.price)
        .bind(Json(&commit.coin.price_history))
        .bind(commit.coin.price_change_24h)
        .bind(commit.coin.id)
        .bind(commit.coin_version)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(coin) = coin else {
            tx.rollback().await?;
            return Err(StoreError::Conflict(format!(
                "coin {} changed since version {}",
                commit.coin.symbol, commit.coin_version
            )));
        };

        let t = &commit.transaction;
        sqlx::query(
            r#"
            INSERT INTO transactions (id, user_id, coin_id, coin_symbol, trade_type, amount, price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(t.id)
        .bind(t.user_id)
        .bind(t.coin_id)
        .bind(&t.coin_symbol)
        .bind(t.trade_type.as_str())
        .bind(t.amount)
        .bind(t.price)
        .bind(t.timestamp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CommittedTrade {
            user: user.into(),
            coin: coin.into(),
        })
    }

    async fn update_coin(&self, coin: Coin, expected_version: i64) -> Result<Versioned<Coin>> {
        let record: Option<CoinRecord> = sqlx::query_as(&format!(
            r#"
            UPDATE coins
            SET price = $1, price_history = $2, price_change_24h = $3,
                version = version + 1, updated_at = NOW()
            WHERE id = $4 AND version = $5
            RETURNING {COIN_COLUMNS}
            "#
        ))
        .bind(coin.price)
        .bind(Json(&coin.price_history))
        .bind(coin.price_change_24h)
        .bind(coin.id)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => Ok(record.into()),
            None => {
                debug!(symbol = %coin.symbol, expected_version, "Coin update lost version race");
                Err(StoreError::Conflict(format!(
                    "coin {} changed since version {}",
                    coin.symbol, expected_version
                )))
            }
        }
    }

    async fn recent_transactions(&self, user_id: Uuid, limit: usize) -> Result<Vec<Transaction>> {
        let records: Vec<TransactionRecord> = sqlx::query_as(
            r#"
            SELECT id, user_id, coin_id, coin_symbol, trade_type, amount, price, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY seq DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(Transaction::try_from).collect()
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }
}
