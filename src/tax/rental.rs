use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{RentalTaxConfig, TaxConfig};
use crate::decimal::{Money, Rate};
use crate::types::Tenancy;

use super::bracket_tax;

/// the contract facts that drive the rental tax rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RentalContract {
    pub rental_year: i32,
    pub contract_duration_years: u32,
    pub renewal_count: u32,
    /// landlord opted to aggregate rental income with other income (englobamento)
    pub aggregation_elected: bool,
    /// contract under the affordable-rent program
    pub special_contract: bool,
}

impl RentalContract {
    pub fn new(rental_year: i32, contract_duration_years: u32) -> Self {
        Self {
            rental_year,
            contract_duration_years,
            renewal_count: 0,
            aggregation_elected: false,
            special_contract: false,
        }
    }
}

/// rental tax inputs for a single contract
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxRegimeInputs {
    pub contract: RentalContract,
    pub monthly_rent: Money,
}

/// which rule produced the rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalTaxRegime {
    SpecialContract,
    Aggregated,
    ReducedModerateRent,
    StandardFlat,
    DurationTier { min_years: u32 },
    /// tenants landed in different regimes
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalTaxResult {
    pub rate_percent: Decimal,
    pub annual_amount: Money,
    pub monthly_amount: Money,
    pub regime: RentalTaxRegime,
}

/// per-tenant breakdown plus the combined figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerTenantRentalTax {
    pub total: RentalTaxResult,
    pub tenants: Vec<RentalTaxResult>,
}

/// rental income tax for one contract.
///
/// Precedence: affordable-rent contracts, then aggregation with other income,
/// then the moderate-rent regime for the years it covers, then the older
/// contract-duration tiers.
pub fn rental_income_tax(inputs: &TaxRegimeInputs, config: &TaxConfig) -> RentalTaxResult {
    let annual_rent = annual(inputs.monthly_rent);

    if inputs.contract.aggregation_elected && !inputs.contract.special_contract {
        let tax = bracket_tax(annual_rent, &config.income_brackets);
        return build_result(tax, annual_rent, RentalTaxRegime::Aggregated, Decimal::ZERO);
    }

    let (rate, regime) = flat_rate(&inputs.contract, inputs.monthly_rent, &config.rental);
    build_result(annual_rent.apply_rate(rate), annual_rent, regime, rate.as_percentage())
}

/// rental income tax evaluated tenant by tenant.
///
/// Each tenancy is tested against the moderate-rent ceiling on its own rent, so a
/// property whose combined rent exceeds the ceiling keeps the reduced rate as
/// long as every individual tenancy is below it. Aggregated income is still
/// taxed on the combined total because the progressive brackets are per
/// taxpayer; the tax is then shared pro rata.
pub fn rental_income_tax_per_tenant(
    contract: &RentalContract,
    tenant_rents: &[Money],
    config: &TaxConfig,
) -> PerTenantRentalTax {
    let rents: Vec<Money> = tenant_rents.iter().map(|rent| rent.non_negative()).collect();
    let combined_monthly: Money = rents.iter().sum();
    let combined_annual = annual(combined_monthly);

    if contract.aggregation_elected && !contract.special_contract {
        let total_tax = bracket_tax(combined_annual, &config.income_brackets);
        let tenants = rents
            .iter()
            .map(|rent| {
                let share = if combined_annual.is_positive() {
                    total_tax * (annual(*rent).as_decimal() / combined_annual.as_decimal())
                } else {
                    Money::ZERO
                };
                build_result(share, annual(*rent), RentalTaxRegime::Aggregated, Decimal::ZERO)
            })
            .collect();

        return PerTenantRentalTax {
            total: build_result(total_tax, combined_annual, RentalTaxRegime::Aggregated, Decimal::ZERO),
            tenants,
        };
    }

    let tenants: Vec<RentalTaxResult> = rents
        .iter()
        .map(|rent| {
            let (rate, regime) = flat_rate(contract, *rent, &config.rental);
            let annual_rent = annual(*rent);
            build_result(annual_rent.apply_rate(rate), annual_rent, regime, rate.as_percentage())
        })
        .collect();

    let total_tax: Money = tenants.iter().map(|t| t.annual_amount).sum();
    let (regime, nominal_percent) = match tenants.first() {
        Some(first) if tenants.iter().all(|t| t.regime == first.regime) => (first.regime, first.rate_percent),
        Some(_) => (RentalTaxRegime::Mixed, Decimal::ZERO),
        None => {
            let (rate, regime) = flat_rate(contract, Money::ZERO, &config.rental);
            (regime, rate.as_percentage())
        }
    };

    PerTenantRentalTax {
        total: build_result(total_tax, combined_annual, regime, nominal_percent),
        tenants,
    }
}

/// dispatch on how the property is let
pub fn rental_income_tax_for(
    contract: &RentalContract,
    monthly_rent: Money,
    tenancy: &Tenancy,
    config: &TaxConfig,
) -> RentalTaxResult {
    match tenancy {
        Tenancy::PerTenant(rents) if !rents.is_empty() => {
            rental_income_tax_per_tenant(contract, rents, config).total
        }
        _ => rental_income_tax(
            &TaxRegimeInputs {
                contract: *contract,
                monthly_rent,
            },
            config,
        ),
    }
}

/// flat rate for one contract at one monthly rent
fn flat_rate(contract: &RentalContract, monthly_rent: Money, config: &RentalTaxConfig) -> (Rate, RentalTaxRegime) {
    if contract.special_contract {
        return (config.special_contract_rate, RentalTaxRegime::SpecialContract);
    }

    let regime = &config.new_regime;
    if regime.applies_to(contract.rental_year) {
        return if monthly_rent <= regime.rent_ceiling {
            (regime.reduced_rate, RentalTaxRegime::ReducedModerateRent)
        } else {
            (regime.standard_rate, RentalTaxRegime::StandardFlat)
        };
    }

    let tier = config
        .legacy_tiers
        .iter()
        .rev()
        .find(|tier| contract.contract_duration_years >= tier.min_years);

    match tier {
        Some(tier) => {
            let discount = tier.renewal_step.as_decimal() * Decimal::from(contract.renewal_count);
            let floor = tier.floor.min(tier.rate).as_decimal();
            let rate = (tier.rate.as_decimal() - discount).max(floor);
            (
                Rate::from_decimal(rate),
                RentalTaxRegime::DurationTier { min_years: tier.min_years },
            )
        }
        None => (regime.standard_rate, RentalTaxRegime::StandardFlat),
    }
}

fn annual(monthly: Money) -> Money {
    monthly.non_negative() * Decimal::from(12)
}

/// effective rate on the rent collected; with no rent, the regime's own rate (`nominal_percent`)
fn build_result(
    annual_tax: Money,
    annual_rent: Money,
    regime: RentalTaxRegime,
    nominal_percent: Decimal,
) -> RentalTaxResult {
    let annual_amount = annual_tax.non_negative().round_cents();
    let rate_percent = if annual_rent.is_positive() {
        (annual_tax.as_decimal() / annual_rent.as_decimal() * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        nominal_percent.round_dp(2)
    };

    RentalTaxResult {
        rate_percent,
        annual_amount,
        monthly_amount: (annual_amount / Decimal::from(12)).round_cents(),
        regime,
    }
}
