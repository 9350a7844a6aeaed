//! 정산/가격 불변식 속성 테스트
//!
//! 임의의 거래 및 틱 시퀀스 이후에도 보유 수량은 항상 양수이고
//! 코인 가격은 항상 양수인지 확인합니다.

use chrono::Utc;
use coinsim_core::{
    drifted_price, settle_trade, Coin, TradeError, TradeType, User, DEFAULT_IMPACT_FACTOR,
    MIN_PRICE,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn trade_type() -> impl Strategy<Value = TradeType> {
    prop_oneof![Just(TradeType::Buy), Just(TradeType::Sell)]
}

/// 0.01 ~ 500.00 범위의 수량
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..=50_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #[test]
    fn holdings_never_zero_or_negative(
        ops in prop::collection::vec((trade_type(), amount()), 1..60)
    ) {
        let mut user = User::new("prop", "hash", dec!(10000));
        let mut coin = Coin::new("NOVA", "Novacoin", dec!(3.2), dec!(500000000), 1440, Utc::now());

        for (trade_type, amount) in ops {
            match settle_trade(&user, &coin, trade_type, amount, DEFAULT_IMPACT_FACTOR, Utc::now()) {
                Ok(settlement) => {
                    user = settlement.user;
                    coin = settlement.coin;
                }
                Err(TradeError::InsufficientFunds { .. })
                | Err(TradeError::InsufficientHoldings { .. }) => {}
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }

            prop_assert!(user.balance >= Decimal::ZERO);
            prop_assert!(coin.price > Decimal::ZERO);
            for (_, qty) in user.holdings.iter() {
                prop_assert!(*qty > Decimal::ZERO);
            }
        }
    }

    #[test]
    fn rejected_trade_changes_nothing(
        amount in amount(),
        balance in (0i64..1_000).prop_map(Decimal::from)
    ) {
        let user = User::new("prop", "hash", balance);
        let coin = Coin::new("QBT", "Qubit", dec!(1280), dec!(5000000), 1440, Utc::now());
        let total = amount * coin.price;

        let result = settle_trade(&user, &coin, TradeType::Buy, amount, DEFAULT_IMPACT_FACTOR, Utc::now());
        if total > balance {
            let is_insufficient = matches!(result, Err(TradeError::InsufficientFunds { .. }));
            prop_assert!(is_insufficient);
        } else {
            prop_assert!(result.is_ok());
        }
        prop_assert_eq!(user.balance, balance);
        prop_assert!(user.holdings.is_empty());
        prop_assert_eq!(coin.price, dec!(1280));
    }

    #[test]
    fn price_stays_positive_under_drift(
        changes in prop::collection::vec(-3000i64..=3000, 1..500)
    ) {
        let mut price = dec!(0.85);
        for change in changes {
            // ±0.3% 범위
            price = drifted_price(price, Decimal::new(change, 6));
            prop_assert!(price >= MIN_PRICE);
        }
    }

    #[test]
    fn impact_direction_and_magnitude(amount in amount()) {
        let coin = Coin::new("CRN", "Cryptonium", dec!(175), dec!(21000000), 1440, Utc::now());
        let mut user = User::new("prop", "hash", dec!(1000000));
        user.holdings.credit("CRN", dec!(1000)).unwrap();

        let bought = settle_trade(&user, &coin, TradeType::Buy, amount, DEFAULT_IMPACT_FACTOR, Utc::now()).unwrap();
        prop_assert!(bought.coin.price > coin.price);
        prop_assert_eq!(bought.coin.price - coin.price, coin.price * DEFAULT_IMPACT_FACTOR * amount);

        let sold = settle_trade(&user, &coin, TradeType::Sell, amount, DEFAULT_IMPACT_FACTOR, Utc::now()).unwrap();
        prop_assert!(sold.coin.price < coin.price);
        prop_assert_eq!(coin.price - sold.coin.price, coin.price * DEFAULT_IMPACT_FACTOR * amount);
    }
}
