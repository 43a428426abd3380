use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, TaxConfig};
use crate::decimal::{Money, Rate};
use crate::loan::LoanTerms;
use crate::tax::{capital_gains_tax_with_costs, transfer_tax};
use crate::types::{ExitPath, FinancingMode, RentalType};

use super::investment::{analyze_investment, AnalysisInputs, GrowthAssumptions, OperatingAssumptions};

/// highest LTV used when sizing a replacement purchase
const MAX_REBUY_LTV: Decimal = Decimal::from_parts(9, 0, 0, false, 1);

const PRICE_SEARCH_ITERATIONS: u32 = 100;

/// the replacement property bought with the sale proceeds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RebuyAssumptions {
    pub ltv: Rate,
    /// annual gross rent over price
    pub gross_yield: Rate,
    pub first_home: bool,
    pub annual_rate: Rate,
    pub loan_term_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellOrKeepInputs {
    pub current_value: Money,
    pub purchase_price: Money,
    pub outstanding_debt: Money,
    pub loan_rate: Rate,
    pub remaining_term_years: u32,
    pub annual_rent: Money,
    pub annual_opex: Money,
    /// agency and legal costs as a share of the sale price
    pub selling_costs: Rate,
    pub is_resident: bool,
    pub horizon_years: u32,
    pub growth: GrowthAssumptions,
    pub alternative_return: Rate,
    pub rebuy: RebuyAssumptions,
}

/// what selling today leaves in hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleProceeds {
    pub sale_price: Money,
    pub selling_costs: Money,
    pub debt_repaid: Money,
    pub capital_gains_tax: Money,
    /// negative when the sale does not clear the debt
    pub net_proceeds: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathOutcome {
    pub path: ExitPath,
    /// wealth at the end of each year, index 0 is today
    pub yearly_wealth: Vec<Money>,
    pub final_wealth: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellOrKeepComparison {
    pub sale: SaleProceeds,
    /// price of the replacement property, zero if the proceeds cannot fund one
    pub rebuy_price: Money,
    pub paths: Vec<PathOutcome>,
    pub recommendation: ExitPath,
}

impl SellOrKeepComparison {
    pub fn outcome(&self, path: ExitPath) -> Option<&PathOutcome> {
        self.paths.iter().find(|p| p.path == path)
    }

    /// hold wealth minus the better of the two sell paths
    pub fn hold_advantage(&self) -> Money {
        let hold = self
            .outcome(ExitPath::Hold)
            .map(|p| p.final_wealth)
            .unwrap_or(Money::ZERO);
        let best_sell = self
            .paths
            .iter()
            .filter(|p| p.path != ExitPath::Hold)
            .map(|p| p.final_wealth)
            .max()
            .unwrap_or(Money::ZERO);
        hold - best_sell
    }
}

/// Compare selling (and reinvesting or rebuying) against holding.
///
/// The recommendation is the path with the highest wealth at the horizon; ties
/// go to holding.
pub fn compare_sell_or_keep(inputs: &SellOrKeepInputs, config: &EngineConfig) -> SellOrKeepComparison {
    log::debug!(
        "comparing sell or keep over {} years, value {} debt {}",
        inputs.horizon_years,
        inputs.current_value,
        inputs.outstanding_debt
    );

    let sale = sale_proceeds(inputs, &config.tax);
    let (rebuy_price, rebuy) = sell_and_rebuy(inputs, sale.net_proceeds, config);

    let paths = vec![
        sell_and_reinvest(inputs, sale.net_proceeds),
        rebuy,
        hold(inputs),
    ];

    let recommendation = paths
        .iter()
        .max_by(|a, b| a.final_wealth.cmp(&b.final_wealth))
        .map(|p| p.path)
        .unwrap_or(ExitPath::Hold);

    SellOrKeepComparison {
        sale,
        rebuy_price,
        paths,
        recommendation,
    }
}

/// proceeds of selling at today's value
pub fn sale_proceeds(inputs: &SellOrKeepInputs, config: &TaxConfig) -> SaleProceeds {
    let sale_price = inputs.current_value.non_negative();
    let selling_costs = sale_price.apply_rate(inputs.selling_costs.max(Rate::ZERO)).round_cents();
    let debt_repaid = inputs.outstanding_debt.non_negative();
    let capital_gains_tax = capital_gains_tax_with_costs(
        sale_price,
        inputs.purchase_price,
        selling_costs,
        inputs.is_resident,
        config,
    );

    SaleProceeds {
        sale_price,
        selling_costs,
        debt_repaid,
        capital_gains_tax,
        net_proceeds: (sale_price - selling_costs - debt_repaid - capital_gains_tax).round_cents(),
    }
}

/// Largest purchase price the equity can fund: equity plus an LTV loan must
/// cover the price and its transfer tax. Found by bisection since the
/// own-home IMT schedule is not linear.
pub fn rebuy_purchase_price(equity: Money, rebuy: &RebuyAssumptions, config: &TaxConfig) -> Money {
    if !equity.is_positive() {
        return Money::ZERO;
    }

    let ltv = rebuy.ltv.max(Rate::ZERO).min(Rate::from_decimal(MAX_REBUY_LTV));
    let cash_needed = |price: Money| price + transfer_tax(price, rebuy.first_home, config) - price.apply_rate(ltv);

    let mut low = Money::ZERO;
    let mut high = equity / (Decimal::ONE - ltv.as_decimal());

    for _ in 0..PRICE_SEARCH_ITERATIONS {
        if high - low < Money::CENT {
            break;
        }
        let mid = (low + high) / Decimal::TWO;
        if cash_needed(mid) <= equity {
            low = mid;
        } else {
            high = mid;
        }
    }

    low.floor_cents()
}

fn sell_and_reinvest(inputs: &SellOrKeepInputs, proceeds: Money) -> PathOutcome {
    let yearly_wealth = (0..=inputs.horizon_years)
        .map(|year| {
            if proceeds.is_positive() {
                proceeds.compound(inputs.alternative_return, year).round_cents()
            } else {
                proceeds
            }
        })
        .collect();

    outcome(ExitPath::SellAndReinvest, yearly_wealth)
}

fn sell_and_rebuy(inputs: &SellOrKeepInputs, proceeds: Money, config: &EngineConfig) -> (Money, PathOutcome) {
    let price = rebuy_purchase_price(proceeds, &inputs.rebuy, &config.tax);
    if !price.is_positive() {
        let flat = vec![proceeds; inputs.horizon_years as usize + 1];
        return (Money::ZERO, outcome(ExitPath::SellAndRebuy, flat));
    }

    // running costs keep the same proportion of rent as the current property
    let annual_rent = price.apply_rate(inputs.rebuy.gross_yield.max(Rate::ZERO));
    let opex_ratio = if inputs.annual_rent.is_positive() {
        inputs.annual_opex.non_negative().as_decimal() / inputs.annual_rent.as_decimal()
    } else {
        Decimal::ZERO
    };

    let analysis_inputs = AnalysisInputs {
        purchase_price: price,
        first_home: inputs.rebuy.first_home,
        notary_fees: Money::ZERO,
        renovation_costs: Money::ZERO,
        furnishing_costs: Money::ZERO,
        financing: FinancingMode::FixedEquity(proceeds),
        annual_rate: inputs.rebuy.annual_rate,
        loan_term_years: inputs.rebuy.loan_term_years,
        rental: RentalType::LongTerm {
            monthly_rent: annual_rent / Decimal::from(12),
        },
        operating: OperatingAssumptions {
            property_tax_rate: Some(Rate::ZERO),
            other_annual_costs: annual_rent * opex_ratio,
            ..OperatingAssumptions::default()
        },
        growth: inputs.growth,
        horizon_years: inputs.horizon_years,
        include_stamp_duty: false,
    };

    let analysis = analyze_investment(&analysis_inputs, config);
    let loan = LoanTerms::new(
        analysis.totals.loan_amount,
        inputs.rebuy.annual_rate,
        inputs.rebuy.loan_term_years,
    );

    let mut yearly_wealth = Vec::with_capacity(inputs.horizon_years as usize + 1);
    let mut cashflow_sum = Money::ZERO;
    yearly_wealth.push(price - analysis.totals.loan_amount);

    for projection in &analysis.projections {
        cashflow_sum += projection.net_cashflow;
        let value = price.compound(inputs.growth.value, projection.year);
        let debt = loan.remaining_balance(projection.year.saturating_mul(12));
        yearly_wealth.push((cashflow_sum + value - debt).round_cents());
    }

    (price, outcome(ExitPath::SellAndRebuy, yearly_wealth))
}

fn hold(inputs: &SellOrKeepInputs) -> PathOutcome {
    let loan = LoanTerms::new(
        inputs.outstanding_debt.non_negative(),
        inputs.loan_rate,
        inputs.remaining_term_years,
    );
    let annual_debt_service = loan.annual_debt_service();

    let mut yearly_wealth = Vec::with_capacity(inputs.horizon_years as usize + 1);
    yearly_wealth.push((inputs.current_value.non_negative() - loan.principal).round_cents());

    let mut rent = inputs.annual_rent.non_negative();
    let mut opex = inputs.annual_opex.non_negative();
    let mut cashflow_sum = Money::ZERO;

    for year in 1..=inputs.horizon_years {
        if year > 1 {
            rent = rent.compound(inputs.growth.rent, 1);
            opex = opex.compound(inputs.growth.cost, 1);
        }
        let debt_service = if year <= inputs.remaining_term_years {
            annual_debt_service
        } else {
            Money::ZERO
        };
        cashflow_sum += rent - opex - debt_service;

        let value = inputs.current_value.non_negative().compound(inputs.growth.value, year);
        let debt = loan.remaining_balance(year.saturating_mul(12));
        yearly_wealth.push((cashflow_sum + value - debt).round_cents());
    }

    outcome(ExitPath::Hold, yearly_wealth)
}

fn outcome(path: ExitPath, yearly_wealth: Vec<Money>) -> PathOutcome {
    let final_wealth = yearly_wealth.last().copied().unwrap_or(Money::ZERO);
    PathOutcome {
        path,
        yearly_wealth,
        final_wealth,
    }
}

/// percentage-point shocks applied to value growth and the alternative return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressMatrix {
    pub value_growth_shocks: Vec<Decimal>,
    pub alternative_return_shocks: Vec<Decimal>,
}

impl Default for StressMatrix {
    fn default() -> Self {
        let points: Vec<Decimal> = (-2..=2).map(Decimal::from).collect();
        Self {
            value_growth_shocks: points.clone(),
            alternative_return_shocks: points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressCell {
    pub value_growth_shock: Decimal,
    pub alternative_return_shock: Decimal,
    pub hold_advantage: Money,
    pub recommendation: ExitPath,
}

/// rows follow `value_growth_shocks`, columns `alternative_return_shocks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestMatrix {
    pub rows: Vec<Vec<StressCell>>,
}

impl StressTestMatrix {
    /// share of scenarios in which holding wins, percent
    pub fn hold_share(&self) -> Decimal {
        let cells: Vec<&StressCell> = self.rows.iter().flatten().collect();
        if cells.is_empty() {
            return Decimal::ZERO;
        }
        let holds = cells.iter().filter(|c| c.recommendation == ExitPath::Hold).count();
        (Decimal::from(holds as u64) / Decimal::from(cells.len() as u64) * Decimal::ONE_HUNDRED).round_dp(2)
    }
}

/// rerun the comparison for every pair of shocks
pub fn stress_test(inputs: &SellOrKeepInputs, matrix: &StressMatrix, config: &EngineConfig) -> StressTestMatrix {
    let rows = matrix
        .value_growth_shocks
        .iter()
        .map(|value_shock| {
            matrix
                .alternative_return_shocks
                .iter()
                .map(|return_shock| {
                    let mut shocked = inputs.clone();
                    shocked.growth.value = inputs.growth.value.shifted_by_points(*value_shock);
                    shocked.alternative_return = inputs.alternative_return.shifted_by_points(*return_shock);

                    let comparison = compare_sell_or_keep(&shocked, config);
                    StressCell {
                        value_growth_shock: *value_shock,
                        alternative_return_shock: *return_shock,
                        hold_advantage: comparison.hold_advantage(),
                        recommendation: comparison.recommendation,
                    }
                })
                .collect()
        })
        .collect();

    StressTestMatrix { rows }
}
