use crate::config::TaxConfig;
use crate::decimal::Money;

/// mais-valias on a property sale
pub fn capital_gains_tax(sale_price: Money, purchase_price: Money, is_resident: bool, config: &TaxConfig) -> Money {
    capital_gains_tax_with_costs(sale_price, purchase_price, Money::ZERO, is_resident, config)
}

/// mais-valias with deductible costs (selling commission, documented improvements)
/// taken off the gain before the inclusion rate applies
pub fn capital_gains_tax_with_costs(
    sale_price: Money,
    purchase_price: Money,
    deductible_costs: Money,
    is_resident: bool,
    config: &TaxConfig,
) -> Money {
    let gain = (sale_price.non_negative() - purchase_price.non_negative() - deductible_costs.non_negative())
        .non_negative();

    let inclusion = if is_resident {
        config.capital_gains.resident_inclusion
    } else {
        config.capital_gains.non_resident_inclusion
    };

    gain.apply_rate(inclusion)
        .apply_rate(config.capital_gains.rate)
        .round_cents()
}
