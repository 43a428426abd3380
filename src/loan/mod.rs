pub mod amortization;

use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};

pub use amortization::{
    amortization_schedule, monthly_payment, months_to_repay, remaining_balance, AmortizationRow,
    Payoff,
};

/// terms of a level-payment mortgage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_years: u32,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate: Rate, term_years: u32) -> Self {
        Self {
            principal,
            annual_rate,
            term_years,
        }
    }

    pub fn term_months(&self) -> u32 {
        self.term_years * 12
    }

    pub fn monthly_payment(&self) -> Money {
        monthly_payment(self.principal, self.annual_rate, self.term_years)
    }

    pub fn annual_debt_service(&self) -> Money {
        self.monthly_payment() * rust_decimal::Decimal::from(12)
    }

    pub fn remaining_balance(&self, payments_made: u32) -> Money {
        remaining_balance(self.principal, self.annual_rate, self.term_years, payments_made)
    }

    pub fn schedule(&self) -> Vec<AmortizationRow> {
        amortization_schedule(self.principal, self.annual_rate, self.term_years)
    }

    /// interest paid over the life of the loan
    pub fn total_interest(&self) -> Money {
        self.schedule().iter().map(|row| row.interest_portion).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_terms_delegate() {
        let loan = LoanTerms::new(Money::from_major(120_000), Rate::from_percentage(3), 20);

        assert_eq!(loan.term_months(), 240);
        assert_eq!(loan.schedule().len(), 240);
        assert_eq!(loan.remaining_balance(240), Money::ZERO);
        assert_eq!(
            loan.annual_debt_service(),
            loan.monthly_payment() * rust_decimal::Decimal::from(12)
        );
    }

    #[test]
    fn test_total_interest() {
        let loan = LoanTerms::new(Money::from_major(120_000), Rate::from_percentage(3), 20);
        let paid: Money = loan.schedule().iter().map(|row| row.payment).sum();

        assert!(loan.total_interest().is_positive());
        assert_eq!(paid - loan.principal, loan.total_interest());

        let free = LoanTerms::new(Money::from_major(12_000), Rate::ZERO, 1);
        assert_eq!(free.total_interest(), Money::ZERO);
    }
}
