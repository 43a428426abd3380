pub mod analysis;
pub mod cashflow;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod loan;
pub mod metrics;
pub mod services;
pub mod snowball;
pub mod tax;
pub mod types;

// re-export key types
pub use decimal::{Money, Rate};
pub use errors::{EngineError, Result};
pub use config::{EngineConfig, IrrConfig, SnowballConfig, TaxConfig};
pub use loan::{amortization_schedule, monthly_payment, remaining_balance, AmortizationRow, LoanTerms};
pub use tax::{
    annual_property_tax, capital_gains_tax, rental_income_tax, rental_income_tax_per_tenant,
    transfer_tax, RentalContract, RentalTaxResult, TaxRegimeInputs,
};
pub use cashflow::{property_cashflow, CashflowExpenses, PropertyCashflowInputs, PropertyCashflowResult};
pub use metrics::{
    break_even_occupancy, cash_on_cash, dscr, gross_yield, irr, net_yield, DSCR_NO_DEBT,
};
pub use analysis::{
    analyze_investment, compare_sell_or_keep, stress_test, AnalysisInputs, InvestmentAnalysis,
    SellOrKeepComparison, SellOrKeepInputs,
};
pub use snowball::{compare_strategies, simulate_snowball, SnowballPlan, SnowballProperty, SnowballResult};
pub use services::{AdviceGenerator, AdviceResult, ListingContent, ListingExtractor, PropertyRecord};
pub use types::{ExitPath, FinancingMode, PropertyId, RentalType, SnowballStrategy, Tenancy};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
