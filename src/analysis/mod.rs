//! Multi-year evaluations built on the loan, tax and metrics modules.

pub mod investment;
pub mod sell_or_keep;

pub use investment::{
    analyze_investment, AnalysisInputs, ExitAnalysis, GrowthAssumptions, InvestmentAnalysis,
    InvestmentKpis, InvestmentTotals, OperatingAssumptions, YearlyProjection,
};
pub use sell_or_keep::{
    compare_sell_or_keep, rebuy_purchase_price, sale_proceeds, stress_test, PathOutcome,
    RebuyAssumptions, SaleProceeds, SellOrKeepComparison, SellOrKeepInputs, StressCell,
    StressMatrix, StressTestMatrix,
};
