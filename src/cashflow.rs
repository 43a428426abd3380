use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::TaxConfig;
use crate::decimal::{Money, Rate};
use crate::tax::{rental_income_tax_for, RentalContract};
use crate::types::Tenancy;

/// monthly figures for one let property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyCashflowInputs {
    pub monthly_rent: Money,
    pub monthly_subsidy: Money,
    pub monthly_mortgage_payment: Money,
    pub property_value: Money,
    pub annual_property_tax_rate: Rate,
    pub annual_insurance: Money,
    pub annual_maintenance: Money,
    /// share of gross income set aside for empty months
    pub vacancy_buffer: Rate,
    pub management_fee: Rate,
    pub other_monthly_expenses: Money,
    pub contract: RentalContract,
    pub tenancy: Tenancy,
}

/// monthly expense breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CashflowExpenses {
    pub mortgage: Money,
    pub property_tax: Money,
    pub rental_tax: Money,
    pub insurance: Money,
    pub maintenance: Money,
    pub vacancy_buffer: Money,
    pub management: Money,
    pub other: Money,
}

impl CashflowExpenses {
    pub fn total(&self) -> Money {
        self.mortgage
            + self.property_tax
            + self.rental_tax
            + self.insurance
            + self.maintenance
            + self.vacancy_buffer
            + self.management
            + self.other
    }

    /// everything except debt service
    pub fn operating(&self) -> Money {
        self.total() - self.mortgage
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyCashflowResult {
    pub gross_income: Money,
    pub expenses: CashflowExpenses,
    pub rental_tax_rate_percent: Decimal,
    pub net_cashflow: Money,
}

impl PropertyCashflowResult {
    pub fn annual_net_cashflow(&self) -> Money {
        self.net_cashflow * Decimal::from(12)
    }

    /// monthly net operating income (before debt service)
    pub fn monthly_noi(&self) -> Money {
        self.gross_income - self.expenses.operating()
    }
}

/// net monthly cashflow of a property after every expense, rental tax included.
///
/// Components are computed at full precision and rounded once on the way out;
/// the net figure is taken from the rounded components so it always reconciles.
pub fn property_cashflow(inputs: &PropertyCashflowInputs, config: &TaxConfig) -> PropertyCashflowResult {
    let twelve = Decimal::from(12);
    let gross_income = inputs.monthly_rent.non_negative() + inputs.monthly_subsidy.non_negative();

    let rental_tax = rental_income_tax_for(
        &inputs.contract,
        inputs.monthly_rent,
        &inputs.tenancy,
        config,
    );

    let expenses = CashflowExpenses {
        mortgage: inputs.monthly_mortgage_payment.non_negative(),
        property_tax: inputs
            .property_value
            .non_negative()
            .apply_rate(non_negative_rate(inputs.annual_property_tax_rate))
            / twelve,
        rental_tax: rental_tax.monthly_amount,
        insurance: inputs.annual_insurance.non_negative() / twelve,
        maintenance: inputs.annual_maintenance.non_negative() / twelve,
        vacancy_buffer: gross_income.apply_rate(non_negative_rate(inputs.vacancy_buffer)),
        management: gross_income.apply_rate(non_negative_rate(inputs.management_fee)),
        other: inputs.other_monthly_expenses.non_negative(),
    };

    let expenses = round_expenses(expenses);
    let gross_income = gross_income.round_cents();
    let net_cashflow = gross_income - expenses.total();

    PropertyCashflowResult {
        gross_income,
        expenses,
        rental_tax_rate_percent: rental_tax.rate_percent,
        net_cashflow,
    }
}

fn round_expenses(expenses: CashflowExpenses) -> CashflowExpenses {
    CashflowExpenses {
        mortgage: expenses.mortgage.round_cents(),
        property_tax: expenses.property_tax.round_cents(),
        rental_tax: expenses.rental_tax.round_cents(),
        insurance: expenses.insurance.round_cents(),
        maintenance: expenses.maintenance.round_cents(),
        vacancy_buffer: expenses.vacancy_buffer.round_cents(),
        management: expenses.management.round_cents(),
        other: expenses.other.round_cents(),
    }
}

fn non_negative_rate(rate: Rate) -> Rate {
    rate.max(Rate::ZERO)
}
