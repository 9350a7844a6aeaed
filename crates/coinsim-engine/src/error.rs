//! 엔진 오류 타입.

use coinsim_core::TradeError;
use coinsim_store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// 거래 실행/가격 갱신 오류.
#[derive(Debug, Error)]
pub enum EngineError {
    /// 비즈니스 규칙 위반 (잔고/보유 부족, 잘못된 수량)
    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Coin not found: {0}")]
    CoinNotFound(String),

    #[error("Invalid transaction type: {0}")]
    InvalidType(String),

    /// 재시도 한도 내에 버전 충돌이 해소되지 않음
    #[error("Too much contention, gave up after {attempts} attempts")]
    Contention { attempts: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// 메트릭 라벨용 결과 이름.
    pub fn outcome(&self) -> &'static str {
        match self {
            EngineError::Trade(TradeError::InsufficientFunds { .. }) => "insufficient_funds",
            EngineError::Trade(TradeError::InsufficientHoldings { .. }) => "insufficient_holdings",
            EngineError::Trade(_) => "invalid_amount",
            EngineError::UserNotFound(_) => "user_not_found",
            EngineError::CoinNotFound(_) => "coin_not_found",
            EngineError::InvalidType(_) => "invalid_type",
            EngineError::Contention { .. } => "contention",
            EngineError::Store(_) => "store_error",
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
