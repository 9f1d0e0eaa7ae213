//! Value objects shared by the catalog, cart and order domains.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Serde format for decimal amounts in persisted blobs.
///
/// Amounts are plain JSON numbers: integral values are written without a
/// fractional part (`3500`), everything else as a float (`2975.5`).
mod number_format {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.fract().is_zero()
            && let Some(whole) = value.to_i64()
        {
            return serializer.serialize_i64(whole);
        }
        rust_decimal::serde::float::serialize(value, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        rust_decimal::serde::float::deserialize(deserializer)
    }
}

/// A monetary amount in the store's currency.
///
/// Backed by a decimal so discounts and sums never pick up binary
/// floating point error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "number_format")] Decimal);

impl Money {
    /// Creates a money amount from a decimal.
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a money amount from whole currency units.
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the underlying decimal amount.
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0 * Decimal::from(quantity))
    }

    /// Returns `percent` percent of this amount.
    pub fn percent(&self, percent: DiscountPercent) -> Money {
        Money(self.0 * percent.value() / Decimal::ONE_HUNDRED)
    }

    /// Divides evenly by `count`, or returns zero when `count` is zero.
    pub fn average_over(&self, count: usize) -> Money {
        if count == 0 {
            return Money::zero();
        }
        Money((self.0 / Decimal::from(count)).round_dp(2).normalize())
    }

    /// Returns this amount as a share of `total`, in percent with one decimal.
    ///
    /// Returns None when `total` is zero.
    pub fn share_of(&self, total: Money) -> Option<Decimal> {
        if total.is_zero() {
            return None;
        }
        let mut share = (self.0 * Decimal::ONE_HUNDRED / total.0)
            .round_dp_with_strategy(1, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
        share.rescale(1);
        Some(share)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut rounded = self.0.round_dp(2);
        rounded.rescale(2);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            write!(f, "-${}", rounded.abs())
        } else {
            write!(f, "${}", rounded.abs())
        }
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// A checkout discount, as a percentage between 0 and 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscountPercent(#[serde(with = "number_format")] Decimal);

impl DiscountPercent {
    /// No discount.
    pub const NONE: DiscountPercent = DiscountPercent(Decimal::ZERO);

    /// Validates and wraps a percentage. Returns None outside `[0, 100]`.
    pub fn new(value: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Decimal::ONE_HUNDRED)
            .contains(&value)
            .then_some(Self(value))
    }

    /// Returns the percentage.
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true for a zero discount.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl std::fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

impl TryFrom<f64> for DiscountPercent {
    type Error = f64;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Decimal::from_f64_retain(value)
            .and_then(|d| d.to_f64().map(|_| d))
            .and_then(DiscountPercent::new)
            .ok_or(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_multiply_and_sum() {
        let price = Money::from_units(3500);
        assert_eq!(price.multiply(3), Money::from_units(10500));

        let total: Money = [Money::from_units(10), Money::from_units(5)].into_iter().sum();
        assert_eq!(total, Money::from_units(15));
    }

    #[test]
    fn money_percent() {
        let subtotal = Money::from_units(3500);
        let fifteen = DiscountPercent::new(Decimal::from(15)).unwrap();
        assert_eq!(subtotal.percent(fifteen), Money::from_units(525));
        assert_eq!(subtotal.percent(DiscountPercent::NONE), Money::zero());
    }

    #[test]
    fn money_average_over_zero_is_zero() {
        assert_eq!(Money::from_units(100).average_over(0), Money::zero());
        assert_eq!(Money::from_units(100).average_over(1), Money::from_units(100));
        assert_eq!(
            Money::from_units(100).average_over(3),
            Money::new(Decimal::new(3333, 2))
        );
    }

    #[test]
    fn money_share_of_total() {
        let share = Money::from_units(1).share_of(Money::from_units(3)).unwrap();
        assert_eq!(share.to_string(), "33.3");

        let whole = Money::from_units(50).share_of(Money::from_units(50)).unwrap();
        assert_eq!(whole.to_string(), "100.0");

        assert!(Money::from_units(5).share_of(Money::zero()).is_none());
    }

    #[test]
    fn money_display() {
        assert_eq!(Money::from_units(3500).to_string(), "$3500.00");
        assert_eq!(Money::new(Decimal::new(297505, 2)).to_string(), "$2975.05");
        assert_eq!(Money::from_units(-12).to_string(), "-$12.00");
    }

    #[test]
    fn money_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&Money::from_units(3500)).unwrap(), "3500");
        assert_eq!(
            serde_json::to_string(&Money::new(Decimal::new(29755, 1))).unwrap(),
            "2975.5"
        );

        let parsed: Money = serde_json::from_str("4200").unwrap();
        assert_eq!(parsed, Money::from_units(4200));
        let parsed: Money = serde_json::from_str("12.5").unwrap();
        assert_eq!(parsed, Money::new(Decimal::new(125, 1)));
    }

    #[test]
    fn discount_bounds() {
        assert!(DiscountPercent::new(Decimal::ZERO).is_some());
        assert!(DiscountPercent::new(Decimal::ONE_HUNDRED).is_some());
        assert!(DiscountPercent::new(Decimal::from(101)).is_none());
        assert!(DiscountPercent::new(Decimal::from(-1)).is_none());
    }

    #[test]
    fn discount_from_f64() {
        assert_eq!(
            DiscountPercent::try_from(12.5).unwrap().value(),
            Decimal::new(125, 1)
        );
        assert!(DiscountPercent::try_from(100.5).is_err());
        assert!(DiscountPercent::try_from(f64::NAN).is_err());
    }
}
