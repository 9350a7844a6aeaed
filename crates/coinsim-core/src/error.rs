//! 거래 도메인 에러 타입.

use rust_decimal::Decimal;
use thiserror::Error;

/// 거래 정산 중 발생하는 비즈니스 규칙 위반.
///
/// 모든 변형은 사용자에게 그대로 노출 가능한 메시지를 가집니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeError {
    /// 수량이 0 이하
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    /// 수량 × 가격이 표현 범위를 초과
    #[error("Amount is too large")]
    AmountTooLarge,

    /// 매수 대금 부족
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// 매도 수량 부족
    #[error("Insufficient holdings of {symbol}: requested {requested}, held {held}")]
    InsufficientHoldings {
        symbol: String,
        requested: Decimal,
        held: Decimal,
    },
}

/// 거래 정산 Result 타입.
pub type TradeResult<T> = Result<T, TradeError>;
