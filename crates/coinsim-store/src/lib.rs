//! 원장 저장소.
//!
//! 이 crate는 다음을 제공합니다:
//! - `LedgerStore` 트레이트 (버전 기반 낙관적 동시성 제어)
//! - 인메모리 저장소 (개발/테스트용)
//! - PostgreSQL 저장소 (sqlx)

pub mod error;
pub mod ledger;
pub mod memory;
pub mod postgres;

pub use error::{Result, StoreError};
pub use ledger::{CommittedTrade, LedgerStore, TradeCommit, TradeSnapshot, Versioned};
pub use memory::MemoryStore;
pub use postgres::PgStore;
