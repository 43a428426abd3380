use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};

/// unique identifier for a property record
pub type PropertyId = Uuid;

/// how a property is let out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RentalType {
    /// long-term tenancy at a fixed monthly rent
    LongTerm { monthly_rent: Money },
    /// short-term (alojamento local) at an average daily rate
    ShortTerm { average_daily_rate: Money, occupancy: Rate },
    /// half the year long-term, half short-term
    Mixed {
        monthly_rent: Money,
        average_daily_rate: Money,
        occupancy: Rate,
    },
}

impl RentalType {
    /// gross rent for the first year of letting
    pub fn first_year_gross_rent(&self) -> Money {
        let days_in_year = Decimal::from(365);
        match self {
            RentalType::LongTerm { monthly_rent } => *monthly_rent * Decimal::from(12),
            RentalType::ShortTerm { average_daily_rate, occupancy } => {
                let occupied_days = days_in_year * occupancy.as_decimal();
                *average_daily_rate * occupied_days
            }
            RentalType::Mixed { monthly_rent, average_daily_rate, occupancy } => {
                let long_term = *monthly_rent * Decimal::from(6);
                let occupied_days = days_in_year / Decimal::TWO * occupancy.as_decimal();
                long_term + *average_daily_rate * occupied_days
            }
        }
        .non_negative()
    }

    /// gross rent at full occupancy, the base for break-even occupancy
    pub fn potential_gross_rent(&self) -> Money {
        let days_in_year = Decimal::from(365);
        match self {
            RentalType::LongTerm { monthly_rent } => *monthly_rent * Decimal::from(12),
            RentalType::ShortTerm { average_daily_rate, .. } => *average_daily_rate * days_in_year,
            RentalType::Mixed { monthly_rent, average_daily_rate, .. } => {
                *monthly_rent * Decimal::from(6) + *average_daily_rate * (days_in_year / Decimal::TWO)
            }
        }
        .non_negative()
    }

    pub fn is_short_term(&self) -> bool {
        !matches!(self, RentalType::LongTerm { .. })
    }
}

/// how the acquisition is financed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FinancingMode {
    /// loan sized as a share of the purchase price
    Ltv(Rate),
    /// buyer puts in a fixed amount, the bank finances the rest of the total investment
    FixedEquity(Money),
}

/// who the rent is collected from, for rental tax purposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Tenancy {
    /// a single contract covering the whole property
    #[default]
    Whole,
    /// separate contracts, one monthly rent per tenant
    PerTenant(Vec<Money>),
}

/// ordering used by the debt snowball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnowballStrategy {
    SmallestBalanceFirst,
    HighestInterestFirst,
}

/// the three paths weighed by the sell-or-keep comparator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitPath {
    /// sell and put the proceeds in an alternative investment
    SellAndReinvest,
    /// sell and use the proceeds as equity for another property
    SellAndRebuy,
    /// keep the property
    Hold,
}
