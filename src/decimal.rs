use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

/// internal precision for intermediate amounts
const INTERNAL_DP: u32 = 8;

/// Money type in euros with 8 decimal places of working precision.
/// Results are rounded to cents with `round_cents` where they leave a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE: Money = Money(Decimal::ONE);
    pub const CENT: Money = Money(Decimal::from_parts(1, 0, 0, false, 2));

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(INTERNAL_DP))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s)?.round_dp(INTERNAL_DP)))
    }

    /// create from whole euros
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from cents (scale 2) or any other minor unit
    pub fn from_minor(amount: i64, scale: u32) -> Self {
        let d = Decimal::from(amount) / Decimal::from(10_u64.pow(scale));
        Money(d.round_dp(INTERNAL_DP))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// round to specified decimal places
    pub fn round_dp(&self, dp: u32) -> Self {
        Money(self.0.round_dp(dp))
    }

    /// round to whole cents
    pub fn round_cents(&self) -> Self {
        self.round_dp(2)
    }

    /// truncate to whole cents, never rounding up
    pub fn floor_cents(&self) -> Self {
        Money(self.0.round_dp_with_strategy(2, RoundingStrategy::ToNegativeInfinity))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// strictly less than zero
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// floor at zero; slider inputs can go transiently negative
    pub fn non_negative(self) -> Self {
        self.max(Money::ZERO)
    }

    /// amount times a rate (e.g. 5% of 100 is 5)
    pub fn apply_rate(&self, rate: Rate) -> Self {
        Money::from_decimal(self.0 * rate.as_decimal())
    }

    /// grow the amount by `rate` compounded over `periods`
    pub fn compound(&self, rate: Rate, periods: u32) -> Self {
        let factor = compound_factor(rate.as_decimal(), periods);
        match self.0.checked_mul(factor) {
            Some(v) => Money::from_decimal(v),
            None => Money(if self.0.is_sign_negative() { Decimal::MIN } else { Decimal::MAX }),
        }
    }
}

/// (1 + rate)^periods by repeated multiplication, saturating instead of overflowing.
/// A base below zero (rate under -100%) is treated as total loss.
pub fn compound_factor(rate: Decimal, periods: u32) -> Decimal {
    let base = (Decimal::ONE + rate).max(Decimal::ZERO);
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor = match factor.checked_mul(base) {
            Some(f) => f,
            None => return Decimal::MAX,
        };
    }
    factor
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(INTERNAL_DP))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = (self.0 + other.0).round_dp(INTERNAL_DP);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(INTERNAL_DP))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = (self.0 - other.0).round_dp(INTERNAL_DP);
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money((self.0 * other).round_dp(INTERNAL_DP))
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money((self.0 / other).round_dp(INTERNAL_DP))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + *x)
    }
}

/// rate type for interest rates, growth rates, tax rates and ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);
    pub const ONE: Rate = Rate(Decimal::ONE);

    /// create from decimal (e.g., 0.05 for 5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percentage (e.g., 5 or dec!(6.5))
    pub fn from_percentage(p: impl Into<Decimal>) -> Self {
        Rate(p.into() / Decimal::ONE_HUNDRED)
    }

    /// create from basis points (e.g., 500 for 5%)
    pub fn from_bps(bps: u32) -> Self {
        Rate(Decimal::from(bps) / Decimal::from(10000))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::ONE_HUNDRED
    }

    pub fn as_bps(&self) -> Decimal {
        self.0 * Decimal::from(10000)
    }

    /// monthly rate from annual rate
    pub fn monthly_rate(&self) -> Rate {
        Rate(self.0 / Decimal::from(12))
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// shift by percentage points, used for stress scenarios
    pub fn shifted_by_points(&self, points: Decimal) -> Rate {
        Rate(self.0 + points / Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let m = Money::from_str_exact("100.123456789").unwrap();
        assert_eq!(m.to_string(), "100.12345679");
        assert_eq!(m.round_cents().to_string(), "100.12");
        assert_eq!(Money::from_str_exact("10.999").unwrap().floor_cents().to_string(), "10.99");
    }

    #[test]
    fn test_cents() {
        assert_eq!(Money::from_minor(1, 2), Money::CENT);
        assert_eq!(Money::from_minor(123_456, 2), Money::from_str_exact("1234.56").unwrap());
    }

    #[test]
    fn test_rate_from_percentage() {
        let rate = Rate::from_percentage(dec!(6.5));
        assert_eq!(rate.as_decimal(), dec!(0.065));
        assert_eq!(Rate::from_percentage(4).monthly_rate().as_percentage().round_dp(4), dec!(0.3333));
        assert_eq!(rate.as_percentage(), dec!(6.5));
    }

    #[test]
    fn test_apply_rate() {
        let price = Money::from_major(250_000);
        assert_eq!(price.apply_rate(Rate::from_percentage(75)), Money::from_major(187_500));
    }

    #[test]
    fn test_compound_growth() {
        let value = Money::from_major(1_000);
        let grown = value.compound(Rate::from_percentage(10), 2);
        assert_eq!(grown, Money::from_major(1_210));

        // below -100% growth the value is wiped out rather than flipping sign
        assert_eq!(value.compound(Rate::from_percentage(-150), 3), Money::ZERO);
    }

    #[test]
    fn test_compound_factor_saturates() {
        assert_eq!(compound_factor(dec!(10), 100), Decimal::MAX);
    }

    #[test]
    fn test_sum_and_negation() {
        let parts = vec![Money::from_major(1), Money::from_major(2), Money::from_major(3)];
        let total: Money = parts.iter().sum();
        assert_eq!(total, Money::from_major(6));
        assert_eq!(-total, Money::from_major(-6));
        assert!(Money::from_major(-5).non_negative().is_zero());
    }
}
