use crate::error::StoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// A non-negative monetary value in the store's currency.
///
/// Wraps `rust_decimal::Decimal` so prices and totals are fixed-point and never
/// pass through floating-point arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, StoreError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(StoreError::ValidationError(
                "Price must not be negative".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units, or `None` when it cannot be represented.
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// Saturates at `Decimal::MAX`. Carts reject lines whose totals overflow,
    /// so amounts derived from a cart never reach the bound.
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }
}

impl TryFrom<Decimal> for Money {
    type Error = StoreError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_validation() {
        assert!(Money::new(dec!(0)).is_ok());
        assert!(Money::new(dec!(4.99)).is_ok());
        assert!(matches!(
            Money::new(dec!(-0.01)),
            Err(StoreError::ValidationError(_))
        ));
    }

    #[test]
    fn test_money_times_and_sum() {
        let unit = Money::new(dec!(4.99)).unwrap();
        assert_eq!(unit.times(3), Money::new(dec!(14.97)).unwrap());
        assert_eq!(unit.times(0), Money::ZERO);

        let total: Money = [unit, unit.times(2)].into_iter().sum();
        assert_eq!(total, Money::new(dec!(14.97)).unwrap());
    }

    #[test]
    fn test_money_overflow_is_detected() {
        let huge = Money::new(dec!(100000000000000000000)).unwrap();
        assert_eq!(huge.checked_times(4_000_000_000), None);
        assert_eq!(huge.times(4_000_000_000).value(), Decimal::MAX);

        let max = Money::new(Decimal::MAX).unwrap();
        assert_eq!(max.checked_add(huge), None);
        assert_eq!(max + huge, max);
        assert_eq!(
            huge.checked_add(huge),
            Some(Money::new(dec!(200000000000000000000)).unwrap())
        );
    }

    #[test]
    fn test_money_rejects_negative_on_deserialize() {
        let parsed: Result<Money, _> = serde_json::from_str("\"-1\"");
        assert!(parsed.is_err());

        let parsed: Money = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(parsed.value(), dec!(12.50));
    }
}
