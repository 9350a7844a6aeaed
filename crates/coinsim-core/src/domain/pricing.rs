//! 가격 계산.
//!
//! 거래에 의한 가격 충격과 시뮬레이터 틱의 랜덤 워크를 계산합니다.
//! 모든 결과 가격은 [`MIN_PRICE`] 이상으로 고정되어 항상 양수입니다.

use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::transaction::TradeType;

/// 가격 하한.
pub const MIN_PRICE: Decimal = dec!(0.00000001);

/// 거래 수량 1당 가격 충격 비율.
pub const DEFAULT_IMPACT_FACTOR: Decimal = dec!(0.00001);

/// 틱당 최대 가격 변동 비율 (0.3%).
pub const DEFAULT_MAX_TICK_CHANGE: Decimal = dec!(0.003);

/// 가격을 하한 이상으로 고정합니다.
pub fn clamp_price(price: Decimal) -> Decimal {
    if price < MIN_PRICE {
        MIN_PRICE
    } else {
        price
    }
}

/// 거래 후 가격.
///
/// `price * (1 ± factor * amount)`. 매수는 상승, 매도는 하락.
pub fn impacted_price(
    price: Decimal,
    trade_type: TradeType,
    amount: Decimal,
    factor: Decimal,
) -> Decimal {
    let Some(shift) = factor.checked_mul(amount) else {
        return match trade_type {
            TradeType::Buy => Decimal::MAX,
            TradeType::Sell => MIN_PRICE,
        };
    };

    let multiplier = match trade_type {
        TradeType::Buy => match Decimal::ONE.checked_add(shift) {
            Some(m) => m,
            None => return Decimal::MAX,
        },
        TradeType::Sell => match Decimal::ONE.checked_sub(shift) {
            Some(m) => m,
            None => return MIN_PRICE,
        },
    };

    match price.checked_mul(multiplier) {
        Some(next) => clamp_price(next),
        None => Decimal::MAX,
    }
}

/// `[-max_change, +max_change]` 구간의 균등 분포 변동률을 뽑습니다.
pub fn draw_change<R: Rng + ?Sized>(rng: &mut R, max_change: Decimal) -> Decimal {
    let bound = max_change.abs();
    let Some(bound_f64) = bound.to_f64() else {
        return Decimal::ZERO;
    };
    if bound_f64 <= 0.0 {
        return Decimal::ZERO;
    }

    let sample = rng.gen_range(-bound_f64..=bound_f64);
    Decimal::try_from(sample)
        .unwrap_or(Decimal::ZERO)
        .clamp(-bound, bound)
}

/// 랜덤 워크 한 스텝 적용: `price * (1 + change)`.
pub fn drifted_price(price: Decimal, change: Decimal) -> Decimal {
    match Decimal::ONE
        .checked_add(change)
        .and_then(|multiplier| price.checked_mul(multiplier))
    {
        Some(next) => clamp_price(next),
        None => price,
    }
}

/// 기준가 대비 변화율 (%).
///
/// 기준가가 0 이하이면 0을 반환하고, 표현 범위를 넘으면 최댓값으로 포화합니다.
pub fn percent_change(current: Decimal, base: Decimal) -> Decimal {
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (current - base)
        .checked_div(base)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .unwrap_or(Decimal::MAX)
}
