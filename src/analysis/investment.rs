use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::loan::LoanTerms;
use crate::metrics::{self, IrrSolution};
use crate::tax::{annual_property_tax, stamp_duty, transfer_tax};
use crate::types::{FinancingMode, RentalType};

/// recurring costs of running the property, year-1 terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OperatingAssumptions {
    /// IMI rate; `None` uses the configured default
    pub property_tax_rate: Option<Rate>,
    pub annual_insurance: Money,
    pub annual_maintenance: Money,
    pub annual_condominium: Money,
    pub other_annual_costs: Money,
    /// share of gross rent
    pub management_fee: Rate,
    /// share of gross rent
    pub vacancy: Rate,
}

/// annual growth rates applied from year 2 onwards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GrowthAssumptions {
    pub rent: Rate,
    pub cost: Rate,
    pub value: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInputs {
    pub purchase_price: Money,
    /// buyer's permanent own home, taxed on the progressive IMT schedule
    pub first_home: bool,
    pub notary_fees: Money,
    pub renovation_costs: Money,
    pub furnishing_costs: Money,
    pub financing: FinancingMode,
    pub annual_rate: Rate,
    pub loan_term_years: u32,
    pub rental: RentalType,
    pub operating: OperatingAssumptions,
    pub growth: GrowthAssumptions,
    pub horizon_years: u32,
    /// add stamp duty on the deed to the acquisition costs
    #[serde(default)]
    pub include_stamp_duty: bool,
}

impl AnalysisInputs {
    /// investor purchase let long-term, no extra costs and no growth
    pub fn long_term(
        purchase_price: Money,
        monthly_rent: Money,
        ltv: Rate,
        annual_rate: Rate,
        loan_term_years: u32,
        horizon_years: u32,
    ) -> Self {
        Self {
            purchase_price,
            first_home: false,
            notary_fees: Money::ZERO,
            renovation_costs: Money::ZERO,
            furnishing_costs: Money::ZERO,
            financing: FinancingMode::Ltv(ltv),
            annual_rate,
            loan_term_years,
            rental: RentalType::LongTerm { monthly_rent },
            operating: OperatingAssumptions::default(),
            growth: GrowthAssumptions::default(),
            horizon_years,
            include_stamp_duty: false,
        }
    }
}

/// acquisition and financing figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentTotals {
    pub purchase_price: Money,
    pub transfer_tax: Money,
    pub stamp_duty: Money,
    pub notary_fees: Money,
    pub renovation_costs: Money,
    pub furnishing_costs: Money,
    pub total_investment: Money,
    pub loan_amount: Money,
    pub own_capital: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
}

/// Headline ratios.
///
/// These are point-in-time figures taken from year 1 of the projection. They do
/// not reflect rent, cost or value growth over the horizon; the IRR on
/// `InvestmentAnalysis` is the horizon-long measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentKpis {
    /// BAR, percent
    pub gross_yield: Decimal,
    /// NAR, percent
    pub net_yield: Decimal,
    pub cash_on_cash: Decimal,
    /// `metrics::DSCR_NO_DEBT` for an unfinanced purchase
    pub dscr: Decimal,
    /// share of full-occupancy rent (every night let, for short-term) that
    /// covers year-1 opex and debt service, percent
    pub break_even_occupancy: Decimal,
    pub gross_rent_multiplier: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProjection {
    pub year: u32,
    pub gross_rent: Money,
    pub opex: Money,
    pub noi: Money,
    pub debt_service: Money,
    pub net_cashflow: Money,
    pub cumulative_cashflow: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitAnalysis {
    pub market_value_at_horizon: Money,
    pub remaining_loan_balance: Money,
    pub net_exit_proceeds: Money,
    /// final cumulative cashflow plus net exit proceeds
    pub total_return: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentAnalysis {
    pub totals: InvestmentTotals,
    pub kpis: InvestmentKpis,
    pub projections: Vec<YearlyProjection>,
    pub exit: ExitAnalysis,
    pub irr: IrrSolution,
}

impl InvestmentAnalysis {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// cumulative cashflow at the end of the horizon (minus own capital at year 0)
    pub fn final_cumulative_cashflow(&self) -> Money {
        self.projections
            .last()
            .map(|p| p.cumulative_cashflow)
            .unwrap_or(-self.totals.own_capital)
    }
}

/// Project an acquisition year by year and evaluate the exit.
///
/// Year-1 rent and operating costs seed the projection; both then grow as
/// aggregates at their own rates. The mortgage payment is fixed for the life
/// of the loan and stops once the term is over.
pub fn analyze_investment(inputs: &AnalysisInputs, config: &EngineConfig) -> InvestmentAnalysis {
    log::debug!(
        "analyzing purchase of {} over {} years",
        inputs.purchase_price,
        inputs.horizon_years
    );

    let totals = acquisition_totals(inputs, config);
    let loan = LoanTerms::new(totals.loan_amount, inputs.annual_rate, inputs.loan_term_years);

    let first_year_rent = inputs.rental.first_year_gross_rent();
    let first_year_opex = first_year_opex(inputs, first_year_rent, config);
    let first_year_noi = first_year_rent - first_year_opex;
    let first_year_cashflow = first_year_noi - totals.annual_debt_service;

    let kpis = InvestmentKpis {
        gross_yield: metrics::gross_yield(first_year_rent, inputs.purchase_price),
        net_yield: metrics::net_yield(first_year_noi, totals.total_investment),
        cash_on_cash: metrics::cash_on_cash(first_year_cashflow, totals.own_capital),
        dscr: metrics::dscr(first_year_noi, totals.annual_debt_service),
        break_even_occupancy: metrics::break_even_occupancy(
            first_year_opex,
            totals.annual_debt_service,
            inputs.rental.potential_gross_rent(),
        ),
        gross_rent_multiplier: metrics::gross_rent_multiplier(inputs.purchase_price, first_year_rent),
    };

    let mut projections = Vec::with_capacity(inputs.horizon_years as usize);
    let mut gross_rent = first_year_rent;
    let mut opex = first_year_opex;
    let mut cumulative = -totals.own_capital;

    for year in 1..=inputs.horizon_years {
        if year > 1 {
            gross_rent = gross_rent.compound(inputs.growth.rent, 1);
            opex = opex.compound(inputs.growth.cost, 1);
        }

        let debt_service = if year <= inputs.loan_term_years {
            totals.annual_debt_service
        } else {
            Money::ZERO
        };

        // reported lines are derived from the rounded components so each row adds up
        let row_rent = gross_rent.round_cents();
        let row_opex = opex.round_cents();
        let row_debt_service = debt_service.round_cents();
        let noi = row_rent - row_opex;
        let net_cashflow = noi - row_debt_service;
        cumulative += net_cashflow;

        projections.push(YearlyProjection {
            year,
            gross_rent: row_rent,
            opex: row_opex,
            noi,
            debt_service: row_debt_service,
            net_cashflow,
            cumulative_cashflow: cumulative.round_cents(),
        });
    }

    let market_value = inputs.purchase_price.compound(inputs.growth.value, inputs.horizon_years);
    let remaining_debt = loan.remaining_balance(inputs.horizon_years.saturating_mul(12));
    let net_exit = market_value - remaining_debt;

    let exit = ExitAnalysis {
        market_value_at_horizon: market_value.round_cents(),
        remaining_loan_balance: remaining_debt.round_cents(),
        net_exit_proceeds: net_exit.round_cents(),
        total_return: (cumulative + net_exit).round_cents(),
    };

    let irr = if projections.is_empty() {
        IrrSolution {
            rate_percent: Decimal::ZERO,
            iterations: 0,
            converged: true,
        }
    } else {
        metrics::solve_irr(&irr_cashflows(totals.own_capital, &projections, net_exit), &config.irr)
    };

    InvestmentAnalysis {
        totals,
        kpis,
        projections,
        exit,
        irr,
    }
}

fn acquisition_totals(inputs: &AnalysisInputs, config: &EngineConfig) -> InvestmentTotals {
    let price = inputs.purchase_price.non_negative();
    let transfer_tax = transfer_tax(price, inputs.first_home, &config.tax);
    let stamp_duty = if inputs.include_stamp_duty {
        stamp_duty(price, &config.tax)
    } else {
        Money::ZERO
    };
    let notary_fees = inputs.notary_fees.non_negative();
    let renovation_costs = inputs.renovation_costs.non_negative();
    let furnishing_costs = inputs.furnishing_costs.non_negative();

    let total_investment = price + transfer_tax + stamp_duty + notary_fees + renovation_costs + furnishing_costs;

    let loan_amount = match inputs.financing {
        FinancingMode::Ltv(ltv) => price.apply_rate(ltv.max(Rate::ZERO)),
        FinancingMode::FixedEquity(equity) => (total_investment - equity.non_negative()).non_negative(),
    }
    .round_cents();

    let loan = LoanTerms::new(loan_amount, inputs.annual_rate, inputs.loan_term_years);

    InvestmentTotals {
        purchase_price: price,
        transfer_tax,
        stamp_duty,
        notary_fees,
        renovation_costs,
        furnishing_costs,
        total_investment: total_investment.round_cents(),
        loan_amount,
        own_capital: (total_investment - loan_amount).round_cents(),
        monthly_payment: loan.monthly_payment(),
        annual_debt_service: loan.annual_debt_service(),
    }
}

fn first_year_opex(inputs: &AnalysisInputs, gross_rent: Money, config: &EngineConfig) -> Money {
    let operating = &inputs.operating;
    let imi_rate = operating
        .property_tax_rate
        .unwrap_or(config.tax.default_property_tax_rate);

    let fixed = annual_property_tax(inputs.purchase_price, imi_rate)
        + operating.annual_insurance.non_negative()
        + operating.annual_maintenance.non_negative()
        + operating.annual_condominium.non_negative()
        + operating.other_annual_costs.non_negative();

    let variable_share = operating.management_fee.max(Rate::ZERO).as_decimal()
        + operating.vacancy.max(Rate::ZERO).as_decimal();

    fixed + gross_rent.apply_rate(Rate::from_decimal(variable_share))
}

/// own capital out at year 0, yearly net cashflows, exit proceeds folded into the last year
fn irr_cashflows(own_capital: Money, projections: &[YearlyProjection], net_exit: Money) -> Vec<Money> {
    let mut flows = Vec::with_capacity(projections.len() + 1);
    flows.push(-own_capital);
    flows.extend(projections.iter().map(|p| p.net_cashflow));
    if let Some(last) = flows.last_mut() {
        *last += net_exit;
    }
    flows
}
