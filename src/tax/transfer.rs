use crate::config::TaxConfig;
use crate::decimal::Money;

use super::bracket_tax;

/// IMT due on a purchase.
///
/// A permanent own home goes through the progressive schedule; anything else
/// pays the flat rate on the full price.
pub fn transfer_tax(purchase_price: Money, first_home: bool, config: &TaxConfig) -> Money {
    let price = purchase_price.non_negative();

    let tax = if first_home {
        bracket_tax(price, &config.transfer.first_home_brackets)
    } else {
        price.apply_rate(config.transfer.flat_rate)
    };

    tax.round_cents()
}

/// imposto do selo on the acquisition deed
pub fn stamp_duty(purchase_price: Money, config: &TaxConfig) -> Money {
    purchase_price
        .non_negative()
        .apply_rate(config.stamp_duty_rate)
        .round_cents()
}
