use chrono::{Months, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::decimal::{Money, Rate};
use crate::loan::months_to_repay;
use crate::types::{PropertyId, SnowballStrategy};

/// a mortgaged property taking part in the snowball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowballProperty {
    pub id: PropertyId,
    pub name: String,
    pub outstanding_debt: Money,
    pub monthly_mortgage_payment: Money,
    /// net monthly cashflow left after the mortgage
    pub monthly_net_cashflow_surplus: Money,
    pub annual_interest_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowballResult {
    pub property_id: PropertyId,
    pub property_name: String,
    pub months_to_payoff: u32,
    pub payoff_date: NaiveDate,
    pub interest_paid: Money,
    /// payoff stopped at the month cap with debt remaining
    pub reached_month_cap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowballPlan {
    pub strategy: SnowballStrategy,
    /// in payoff order
    pub results: Vec<SnowballResult>,
    pub total_months: u32,
    pub debt_free_date: NaiveDate,
    pub total_interest_paid: Money,
}

/// Pay the portfolio down one property at a time.
///
/// The current target receives its own payment, the accumulated extra and the
/// positive surplus of every property still waiting its turn. Once cleared, its
/// payment and surplus join the extra for the next target. Each target is
/// repaid from its full outstanding debt.
pub fn simulate_snowball(
    properties: &[SnowballProperty],
    extra_monthly_payment: Money,
    strategy: SnowballStrategy,
    time_provider: &SafeTimeProvider,
    config: &EngineConfig,
) -> SnowballPlan {
    log::debug!(
        "simulating {:?} snowball over {} properties",
        strategy,
        properties.len()
    );

    let today = time_provider.now().date_naive();
    let order = payoff_order(properties, strategy);

    let mut results = Vec::with_capacity(order.len());
    let mut current_month: u32 = 0;
    let mut available_extra = extra_monthly_payment.non_negative();
    let mut total_interest = Money::ZERO;

    for (position, target) in order.iter().enumerate() {
        let own_payment = target.monthly_mortgage_payment.non_negative();
        let own_surplus = target.monthly_net_cashflow_surplus.non_negative();

        let (months, interest_paid, reached_month_cap) = if target.outstanding_debt.is_positive() {
            let pooled_surplus: Money = order[position + 1..]
                .iter()
                .map(|p| p.monthly_net_cashflow_surplus.non_negative())
                .sum();
            let effective_payment = own_payment + available_extra + pooled_surplus;

            let payoff = months_to_repay(
                target.outstanding_debt,
                target.annual_interest_rate,
                effective_payment,
                config.snowball.max_months,
            );
            if payoff.reached_cap {
                log::warn!(
                    "{} not repaid within {} months at {} a month",
                    target.name,
                    config.snowball.max_months,
                    effective_payment
                );
            }
            (payoff.months, payoff.interest_paid.round_cents(), payoff.reached_cap)
        } else {
            (0, Money::ZERO, false)
        };

        current_month = current_month.saturating_add(months);
        available_extra += own_payment + own_surplus;
        total_interest += interest_paid;

        results.push(SnowballResult {
            property_id: target.id,
            property_name: target.name.clone(),
            months_to_payoff: months,
            payoff_date: add_months(today, current_month),
            interest_paid,
            reached_month_cap,
        });
    }

    SnowballPlan {
        strategy,
        results,
        total_months: current_month,
        debt_free_date: add_months(today, current_month),
        total_interest_paid: total_interest,
    }
}

/// both strategies side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub smallest_balance_first: SnowballPlan,
    pub highest_interest_first: SnowballPlan,
    /// fewer months wins, then less interest; smallest balance on a full tie
    pub faster: SnowballStrategy,
}

pub fn compare_strategies(
    properties: &[SnowballProperty],
    extra_monthly_payment: Money,
    time_provider: &SafeTimeProvider,
    config: &EngineConfig,
) -> StrategyComparison {
    let smallest_balance_first = simulate_snowball(
        properties,
        extra_monthly_payment,
        SnowballStrategy::SmallestBalanceFirst,
        time_provider,
        config,
    );
    let highest_interest_first = simulate_snowball(
        properties,
        extra_monthly_payment,
        SnowballStrategy::HighestInterestFirst,
        time_provider,
        config,
    );

    let balance_key = (smallest_balance_first.total_months, smallest_balance_first.total_interest_paid);
    let interest_key = (highest_interest_first.total_months, highest_interest_first.total_interest_paid);
    let faster = if interest_key < balance_key {
        SnowballStrategy::HighestInterestFirst
    } else {
        SnowballStrategy::SmallestBalanceFirst
    };

    StrategyComparison {
        smallest_balance_first,
        highest_interest_first,
        faster,
    }
}

/// stable sort, so ties keep their input order
fn payoff_order(properties: &[SnowballProperty], strategy: SnowballStrategy) -> Vec<&SnowballProperty> {
    let mut order: Vec<&SnowballProperty> = properties.iter().collect();
    match strategy {
        SnowballStrategy::SmallestBalanceFirst => {
            order.sort_by(|a, b| a.outstanding_debt.cmp(&b.outstanding_debt));
        }
        SnowballStrategy::HighestInterestFirst => {
            order.sort_by(|a, b| b.annual_interest_rate.cmp(&a.annual_interest_rate));
        }
    }
    order
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn clock() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap()
        ))
    }

    fn property(name: &str, debt: i64, payment: i64, surplus: i64, rate_pct: i64) -> SnowballProperty {
        SnowballProperty {
            id: Uuid::new_v4(),
            name: name.to_string(),
            outstanding_debt: Money::from_major(debt),
            monthly_mortgage_payment: Money::from_major(payment),
            monthly_net_cashflow_surplus: Money::from_major(surplus),
            annual_interest_rate: Rate::from_percentage(rate_pct),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_smallest_balance_first_rolls_payments() {
        let config = EngineConfig::portugal_2026();
        let properties = vec![
            property("Porto", 50_000, 1_000, 200, 0),
            property("Braga", 10_000, 500, 100, 0),
        ];

        let plan = simulate_snowball(
            &properties,
            Money::ZERO,
            SnowballStrategy::SmallestBalanceFirst,
            &clock(),
            &config,
        );

        // Braga: 500 own + 200 pooled from Porto = 700 a month
        assert_eq!(plan.results[0].property_name, "Braga");
        assert_eq!(plan.results[0].months_to_payoff, 15);
        assert_eq!(plan.results[0].payoff_date, date(2027, 4, 15));

        // Porto: 1,000 own + 600 released by Braga
        assert_eq!(plan.results[1].property_name, "Porto");
        assert_eq!(plan.results[1].months_to_payoff, 32);
        assert_eq!(plan.results[1].payoff_date, date(2029, 12, 15));

        assert_eq!(plan.total_months, 47);
        assert_eq!(plan.debt_free_date, date(2029, 12, 15));
        assert_eq!(plan.total_interest_paid, Money::ZERO);
    }

    #[test]
    fn test_highest_interest_first_order() {
        let config = EngineConfig::portugal_2026();
        let properties = vec![
            property("Lisboa", 10_000, 500, 100, 3),
            property("Faro", 50_000, 1_000, 200, 6),
        ];

        let plan = simulate_snowball(
            &properties,
            Money::from_major(250),
            SnowballStrategy::HighestInterestFirst,
            &clock(),
            &config,
        );

        assert_eq!(plan.results[0].property_name, "Faro");
        assert!(plan.results[0].interest_paid.is_positive());
        assert_eq!(plan.strategy, SnowballStrategy::HighestInterestFirst);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let config = EngineConfig::portugal_2026();
        let properties = vec![
            property("first", 20_000, 500, 0, 4),
            property("second", 20_000, 500, 0, 4),
        ];

        for strategy in [SnowballStrategy::SmallestBalanceFirst, SnowballStrategy::HighestInterestFirst] {
            let plan = simulate_snowball(&properties, Money::ZERO, strategy, &clock(), &config);
            assert_eq!(plan.results[0].property_name, "first");
        }
    }

    #[test]
    fn test_paid_off_property_reports_zero_months() {
        let config = EngineConfig::portugal_2026();
        let properties = vec![
            property("owned", 0, 400, 300, 0),
            property("mortgaged", 7_000, 300, 0, 0),
        ];

        let plan = simulate_snowball(
            &properties,
            Money::ZERO,
            SnowballStrategy::SmallestBalanceFirst,
            &clock(),
            &config,
        );

        assert_eq!(plan.results[0].months_to_payoff, 0);
        assert_eq!(plan.results[0].payoff_date, date(2026, 1, 15));
        // 300 own + 700 released
        assert_eq!(plan.results[1].months_to_payoff, 7);
    }

    #[test]
    fn test_month_cap() {
        let config = EngineConfig::portugal_2026();
        let properties = vec![property("stuck", 100_000, 0, 0, 5)];

        let plan = simulate_snowball(
            &properties,
            Money::ZERO,
            SnowballStrategy::SmallestBalanceFirst,
            &clock(),
            &config,
        );

        assert_eq!(plan.results[0].months_to_payoff, 360);
        assert!(plan.results[0].reached_month_cap);
    }

    #[test]
    fn test_empty_portfolio() {
        let config = EngineConfig::portugal_2026();
        let plan = simulate_snowball(&[], Money::from_major(100), SnowballStrategy::SmallestBalanceFirst, &clock(), &config);
        assert!(plan.results.is_empty());
        assert_eq!(plan.total_months, 0);
        assert_eq!(plan.debt_free_date, date(2026, 1, 15));
    }

    #[test]
    fn test_compare_strategies() {
        let config = EngineConfig::portugal_2026();
        let properties = vec![
            property("cheap", 10_000, 300, 50, 2),
            property("expensive", 80_000, 700, 150, 7),
        ];

        let comparison = compare_strategies(&properties, Money::from_major(200), &clock(), &config);
        assert_eq!(comparison.smallest_balance_first.results[0].property_name, "cheap");
        assert_eq!(comparison.highest_interest_first.results[0].property_name, "expensive");

        let winner = match comparison.faster {
            SnowballStrategy::SmallestBalanceFirst => &comparison.smallest_balance_first,
            SnowballStrategy::HighestInterestFirst => &comparison.highest_interest_first,
        };
        assert!(winner.total_months <= comparison.smallest_balance_first.total_months);
        assert!(winner.total_months <= comparison.highest_interest_first.total_months);
    }

    proptest! {
        #[test]
        fn prop_terminates_in_strategy_order(
            specs in prop::collection::vec(
                (0i64..300_000, 0i64..3_000, 1i64..500, 0u32..800),
                1..6,
            ),
            extra in 0i64..1_000,
            highest_interest in any::<bool>(),
        ) {
            let config = EngineConfig::portugal_2026();
            let properties: Vec<SnowballProperty> = specs
                .iter()
                .enumerate()
                .map(|(i, (debt, payment, surplus, bps))| SnowballProperty {
                    id: Uuid::new_v4(),
                    name: format!("property {}", i),
                    outstanding_debt: Money::from_major(*debt),
                    monthly_mortgage_payment: Money::from_major(*payment),
                    monthly_net_cashflow_surplus: Money::from_major(*surplus),
                    annual_interest_rate: Rate::from_bps(*bps),
                })
                .collect();
            let strategy = if highest_interest {
                SnowballStrategy::HighestInterestFirst
            } else {
                SnowballStrategy::SmallestBalanceFirst
            };

            let plan = simulate_snowball(&properties, Money::from_major(extra), strategy, &clock(), &config);
            prop_assert_eq!(plan.results.len(), properties.len());

            let lookup = |id: PropertyId| properties.iter().find(|p| p.id == id).cloned();
            let mut previous: Option<SnowballProperty> = None;
            for result in &plan.results {
                prop_assert!(result.months_to_payoff <= config.snowball.max_months);
                let current = lookup(result.property_id);
                prop_assert!(current.is_some());
                let current = current.unwrap();
                if let Some(prev) = &previous {
                    match strategy {
                        SnowballStrategy::SmallestBalanceFirst => {
                            prop_assert!(prev.outstanding_debt <= current.outstanding_debt)
                        }
                        SnowballStrategy::HighestInterestFirst => {
                            prop_assert!(prev.annual_interest_rate >= current.annual_interest_rate)
                        }
                    }
                }
                previous = Some(current);
            }

            let summed: u32 = plan.results.iter().map(|r| r.months_to_payoff).sum();
            prop_assert_eq!(plan.total_months, summed);
        }
    }
}
