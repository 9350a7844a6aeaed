//! 사용자와 보유 코인.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{TradeError, TradeResult};

/// 코인 심볼 → 보유 수량.
///
/// 보유 수량은 항상 0보다 크며, 0이 되는 순간 키가 제거됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Holdings(BTreeMap<String, Decimal>);

impl Holdings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 심볼의 보유 수량 (없으면 0).
    pub fn quantity(&self, symbol: &str) -> Decimal {
        self.0.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    /// 보유 수량을 늘립니다.
    pub fn credit(&mut self, symbol: &str, quantity: Decimal) -> TradeResult<()> {
        if quantity <= Decimal::ZERO {
            return Err(TradeError::InvalidAmount);
        }
        let held = self.quantity(symbol);
        let next = held
            .checked_add(quantity)
            .ok_or(TradeError::AmountTooLarge)?;
        self.0.insert(symbol.to_string(), next);
        Ok(())
    }

    /// 보유 수량을 줄입니다. 결과가 정확히 0이면 키를 제거합니다.
    pub fn debit(&mut self, symbol: &str, quantity: Decimal) -> TradeResult<()> {
        if quantity <= Decimal::ZERO {
            return Err(TradeError::InvalidAmount);
        }
        let held = self.quantity(symbol);
        if held < quantity {
            return Err(TradeError::InsufficientHoldings {
                symbol: symbol.to_string(),
                requested: quantity,
                held,
            });
        }

        let remaining = held - quantity;
        if remaining.is_zero() {
            self.0.remove(symbol);
        } else {
            self.0.insert(symbol.to_string(), remaining);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Decimal)> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for Holdings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Decimal>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .filter(|(_, qty)| *qty > Decimal::ZERO)
                .collect(),
        ))
    }
}

impl FromIterator<(String, Decimal)> for Holdings {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .filter(|(_, qty)| *qty > Decimal::ZERO)
                .collect(),
        )
    }
}

/// 사용자 계정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// argon2 PHC 문자열. 클라이언트로 직렬화하지 않습니다.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub balance: Decimal,
    pub holdings: Holdings,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// 시작 잔고로 새 사용자를 생성합니다.
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        starting_balance: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            balance: starting_balance,
            holdings: Holdings::new(),
            created_at: Utc::now(),
        }
    }

    /// 클라이언트 노출용 뷰.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            balance: self.balance,
            holdings: self.holdings.clone(),
        }
    }
}

/// 비밀번호 해시를 제외한 사용자 표현.
///
/// `GET /user` 응답과 `userUpdate` 이벤트에서 사용됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub balance: Decimal,
    pub holdings: Holdings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_credit_and_debit() {
        let mut holdings = Holdings::new();
        holdings.credit("CRN", dec!(10)).unwrap();
        holdings.credit("CRN", dec!(2.5)).unwrap();
        assert_eq!(holdings.quantity("CRN"), dec!(12.5));

        holdings.debit("CRN", dec!(2.5)).unwrap();
        assert_eq!(holdings.quantity("CRN"), dec!(10));
    }

    #[test]
    fn test_debit_to_zero_removes_key() {
        let mut holdings = Holdings::new();
        holdings.credit("BLK", dec!(3)).unwrap();
        holdings.debit("BLK", dec!(3)).unwrap();

        assert!(holdings.is_empty());
        assert_eq!(holdings.quantity("BLK"), Decimal::ZERO);
    }

    #[test]
    fn test_debit_more_than_held_fails_without_change() {
        let mut holdings = Holdings::new();
        holdings.credit("NOVA", dec!(1)).unwrap();

        let err = holdings.debit("NOVA", dec!(2)).unwrap_err();
        assert_eq!(
            err,
            TradeError::InsufficientHoldings {
                symbol: "NOVA".to_string(),
                requested: dec!(2),
                held: dec!(1),
            }
        );
        assert_eq!(holdings.quantity("NOVA"), dec!(1));
    }

    #[test]
    fn test_debit_missing_symbol() {
        let mut holdings = Holdings::new();
        assert!(matches!(
            holdings.debit("QBT", dec!(1)),
            Err(TradeError::InsufficientHoldings { .. })
        ));
    }

    #[test]
    fn test_non_positive_quantities_rejected() {
        let mut holdings = Holdings::new();
        assert_eq!(holdings.credit("CRN", dec!(0)), Err(TradeError::InvalidAmount));
        assert_eq!(holdings.debit("CRN", dec!(-1)), Err(TradeError::InvalidAmount));
    }

    #[test]
    fn test_deserialize_drops_non_positive_entries() {
        let holdings: Holdings =
            serde_json::from_str(r#"{"CRN":"5","BLK":"0","LUM":"-2"}"#).unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings.quantity("CRN"), dec!(5));
    }

    #[test]
    fn test_view_hides_password_hash() {
        let user = User::new("alice", "$argon2id$secret", dec!(10000));
        let json = serde_json::to_value(user.view()).unwrap();

        assert_eq!(json["username"], "alice");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
