use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};

/// IMI: assessed value times the municipal rate
pub fn annual_property_tax(assessed_value: Money, rate: Rate) -> Money {
    if !rate.is_positive() {
        return Money::ZERO;
    }
    assessed_value.non_negative().apply_rate(rate).round_cents()
}

pub fn monthly_property_tax(assessed_value: Money, rate: Rate) -> Money {
    (annual_property_tax(assessed_value, rate) / Decimal::from(12)).round_cents()
}
