//! Portuguese tax approximations: IMT and stamp duty on acquisition, IMI on
//! ownership, IRS on rental income and on capital gains.
//!
//! Every function takes the tax tables explicitly and is total: negative or
//! otherwise out-of-range amounts produce zero tax, never an error.

pub mod capital_gains;
pub mod property;
pub mod rental;
pub mod transfer;

use crate::config::TaxBracket;
use crate::decimal::Money;

pub use capital_gains::{capital_gains_tax, capital_gains_tax_with_costs};
pub use property::{annual_property_tax, monthly_property_tax};
pub use rental::{
    rental_income_tax, rental_income_tax_for, rental_income_tax_per_tenant, PerTenantRentalTax,
    RentalContract, RentalTaxRegime, RentalTaxResult, TaxRegimeInputs,
};
pub use transfer::{stamp_duty, transfer_tax};

/// tax on `base` under a bracket table.
///
/// Marginal brackets tax only the slice of the base that falls inside them. If
/// the bracket containing the base is `flat_on_whole`, its rate applies to the
/// whole base instead.
pub(crate) fn bracket_tax(base: Money, brackets: &[TaxBracket]) -> Money {
    if !base.is_positive() {
        return Money::ZERO;
    }

    let mut tax = Money::ZERO;
    let mut lower = Money::ZERO;

    for bracket in brackets {
        let contains = bracket.up_to.map_or(true, |limit| base <= limit);

        if contains && bracket.flat_on_whole {
            return base.apply_rate(bracket.rate);
        }

        let upper = bracket.up_to.map_or(base, |limit| limit.min(base));
        if upper > lower {
            tax += (upper - lower).apply_rate(bracket.rate);
        }

        match bracket.up_to {
            Some(limit) if !contains => lower = limit,
            _ => break,
        }
    }

    tax
}
