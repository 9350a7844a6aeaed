//! 매수/매도 정산.
//!
//! 순수 함수로 사용자/코인 스냅샷에 거래를 적용한 결과를 계산합니다.
//! 저장과 이벤트 발행은 호출자(트랜잭션 엔진)의 책임입니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::coin::Coin;
use super::transaction::{TradeType, Transaction};
use super::user::User;
use crate::error::{TradeError, TradeResult};

/// 정산 결과.
///
/// 세 값은 하나의 원자적 단위로 커밋되어야 합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub user: User,
    pub coin: Coin,
    pub transaction: Transaction,
}

/// 거래를 정산합니다.
///
/// 실패 시 입력 스냅샷은 변경되지 않습니다.
///
/// # Arguments
/// * `user` - 거래 사용자 스냅샷
/// * `coin` - 거래 코인 스냅샷
/// * `trade_type` - 매수/매도
/// * `amount` - 거래 수량 (0 초과)
/// * `impact_factor` - 수량당 가격 충격 비율
/// * `at` - 체결 시각
pub fn settle_trade(
    user: &User,
    coin: &Coin,
    trade_type: TradeType,
    amount: Decimal,
    impact_factor: Decimal,
    at: DateTime<Utc>,
) -> TradeResult<Settlement> {
    if amount <= Decimal::ZERO {
        return Err(TradeError::InvalidAmount);
    }

    let execution_price = coin.price;
    let total_price = amount
        .checked_mul(execution_price)
        .ok_or(TradeError::AmountTooLarge)?;

    let mut next_user = user.clone();
    match trade_type {
        TradeType::Buy => {
            if next_user.balance < total_price {
                return Err(TradeError::InsufficientFunds {
                    required: total_price,
                    available: next_user.balance,
                });
            }
            next_user.balance -= total_price;
            next_user.holdings.credit(&coin.symbol, amount)?;
        }
        TradeType::Sell => {
            next_user.holdings.debit(&coin.symbol, amount)?;
            next_user.balance = next_user
                .balance
                .checked_add(total_price)
                .ok_or(TradeError::AmountTooLarge)?;
        }
    }

    let mut next_coin = coin.clone();
    next_coin.apply_impact(trade_type, amount, impact_factor);

    let transaction = Transaction::new(
        user.id,
        coin.id,
        coin.symbol.clone(),
        trade_type,
        amount,
        execution_price,
        at,
    );

    Ok(Settlement {
        user: next_user,
        coin: next_coin,
        transaction,
    })
}
