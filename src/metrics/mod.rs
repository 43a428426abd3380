//! Yield and coverage ratios.
//!
//! Ratios are returned in percent (2 dp) except DSCR and the gross rent
//! multiplier, which are plain multiples. A denominator at or below zero gives
//! zero rather than an error.

pub mod irr;

pub use irr::{irr, npv, solve_irr, IrrSolution};

use rust_decimal::Decimal;

use crate::decimal::Money;

/// DSCR reported when there is no debt to service
pub const DSCR_NO_DEBT: Decimal = Decimal::MAX;

/// BAR: annual gross rent over purchase price
pub fn gross_yield(annual_gross_rent: Money, purchase_price: Money) -> Decimal {
    percent_of(annual_gross_rent, purchase_price)
}

/// NAR: annual NOI over total investment
pub fn net_yield(annual_noi: Money, total_investment: Money) -> Decimal {
    percent_of(annual_noi, total_investment)
}

/// annual net cashflow over the buyer's own capital
pub fn cash_on_cash(annual_cashflow: Money, own_capital: Money) -> Decimal {
    percent_of(annual_cashflow, own_capital)
}

/// NOI over market value
pub fn cap_rate(annual_noi: Money, market_value: Money) -> Decimal {
    percent_of(annual_noi, market_value)
}

/// NOI over annual debt service; `DSCR_NO_DEBT` if there is no debt service
pub fn dscr(annual_noi: Money, annual_debt_service: Money) -> Decimal {
    if !annual_debt_service.is_positive() {
        return DSCR_NO_DEBT;
    }
    (annual_noi.as_decimal() / annual_debt_service.as_decimal()).round_dp(2)
}

/// occupancy needed to cover operating costs and debt service, clamped to [0, 100]
pub fn break_even_occupancy(annual_opex: Money, annual_debt_service: Money, potential_gross_income: Money) -> Decimal {
    let costs = annual_opex.non_negative() + annual_debt_service.non_negative();

    if !potential_gross_income.is_positive() {
        return if costs.is_positive() {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }

    (costs.as_decimal() / potential_gross_income.as_decimal() * Decimal::ONE_HUNDRED)
        .round_dp(2)
        .max(Decimal::ZERO)
        .min(Decimal::ONE_HUNDRED)
}

/// price as a multiple of annual gross rent
pub fn gross_rent_multiplier(purchase_price: Money, annual_gross_rent: Money) -> Decimal {
    if !annual_gross_rent.is_positive() {
        return Decimal::ZERO;
    }
    (purchase_price.as_decimal() / annual_gross_rent.as_decimal()).round_dp(2)
}

fn percent_of(numerator: Money, denominator: Money) -> Decimal {
    if !denominator.is_positive() {
        return Decimal::ZERO;
    }
    (numerator.as_decimal() / denominator.as_decimal() * Decimal::ONE_HUNDRED).round_dp(2)
}
