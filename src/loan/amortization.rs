use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{compound_factor, Money, Rate};

/// one month of an amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub month: u32,
    pub payment: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub remaining_balance: Money,
}

/// result of paying a balance down at a fixed monthly amount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Payoff {
    pub months: u32,
    pub interest_paid: Money,
    /// the month cap was hit with balance still outstanding
    pub reached_cap: bool,
}

/// level monthly payment (PMT), rounded to cents.
///
/// Falls back to straight-line repayment for a zero rate and returns zero when
/// there is nothing to repay or no term to repay it over.
pub fn monthly_payment(principal: Money, annual_rate: Rate, years: u32) -> Money {
    exact_monthly_payment(principal, annual_rate, years).round_cents()
}

/// outstanding balance after `payments_made` level payments
pub fn remaining_balance(principal: Money, annual_rate: Rate, years: u32, payments_made: u32) -> Money {
    if !principal.is_positive() || years == 0 {
        return Money::ZERO;
    }

    let months = years * 12;
    if payments_made >= months {
        return Money::ZERO;
    }

    if !annual_rate.is_positive() {
        let repaid = exact_monthly_payment(principal, annual_rate, years) * Decimal::from(payments_made);
        return (principal - repaid).non_negative().round_cents();
    }

    // B_k = P(1 - v^(n-k)) / (1 - v^n), v = 1/(1+r); the discount factors stay in (0, 1]
    let r = annual_rate.monthly_rate().as_decimal();
    let outstanding = Decimal::ONE - Decimal::ONE / compound_factor(r, months - payments_made);
    let original = Decimal::ONE - Decimal::ONE / compound_factor(r, months);

    let share = outstanding
        .checked_div(original)
        .unwrap_or_else(|| Decimal::from(months - payments_made) / Decimal::from(months));

    principal.apply_rate(Rate::from_decimal(share)).non_negative().min(principal).round_cents()
}

/// full month-by-month schedule with exactly `years * 12` rows.
///
/// Amounts are carried in whole cents; the last row absorbs the rounding
/// residue so the closing balance is exactly zero and each row's principal and
/// interest add up to its payment.
pub fn amortization_schedule(principal: Money, annual_rate: Rate, years: u32) -> Vec<AmortizationRow> {
    if !principal.is_positive() || years == 0 {
        return Vec::new();
    }

    let months = years * 12;
    let monthly_rate = if annual_rate.is_positive() {
        annual_rate.monthly_rate()
    } else {
        Rate::ZERO
    };
    let payment = monthly_payment(principal, annual_rate, years);

    let mut rows = Vec::with_capacity(months as usize);
    let mut balance = principal.round_cents();

    for month in 1..=months {
        let interest_portion = balance.apply_rate(monthly_rate).round_cents();
        let mut principal_portion = (payment - interest_portion).non_negative();

        if month == months || principal_portion > balance {
            principal_portion = balance;
        }

        balance -= principal_portion;

        rows.push(AmortizationRow {
            month,
            payment: principal_portion + interest_portion,
            principal_portion,
            interest_portion,
            remaining_balance: balance,
        });
    }

    rows
}

/// months needed to clear `balance` paying `payment` every month, capped at `max_months`
pub fn months_to_repay(balance: Money, annual_rate: Rate, payment: Money, max_months: u32) -> Payoff {
    let monthly_rate = if annual_rate.is_positive() {
        annual_rate.monthly_rate()
    } else {
        Rate::ZERO
    };

    let mut remaining = balance;
    let mut months = 0;
    let mut interest_paid = Money::ZERO;

    while remaining.is_positive() && months < max_months {
        // a balance growing past the decimal range is never repaid; stop as capped
        let Some((paid, next)) = accrue_month(remaining, interest_paid, monthly_rate, payment) else {
            log::warn!("balance of {} overflowed after {} months", remaining, months);
            break;
        };
        interest_paid = paid;
        remaining = next;
        months += 1;
    }

    Payoff {
        months,
        interest_paid: interest_paid.round_cents(),
        reached_cap: remaining.is_positive(),
    }
}

/// one month of interest then the payment: (interest paid so far, balance), `None` on overflow
fn accrue_month(remaining: Money, interest_paid: Money, monthly_rate: Rate, payment: Money) -> Option<(Money, Money)> {
    let interest = remaining.as_decimal().checked_mul(monthly_rate.as_decimal())?;
    let paid = interest_paid.as_decimal().checked_add(interest)?;
    let next = remaining
        .as_decimal()
        .checked_add(interest)?
        .checked_sub(payment.as_decimal())?;
    Some((Money::from_decimal(paid), Money::from_decimal(next)))
}

/// unrounded annuity payment
fn exact_monthly_payment(principal: Money, annual_rate: Rate, years: u32) -> Money {
    if !principal.is_positive() || years == 0 {
        return Money::ZERO;
    }

    let months = years * 12;
    if !annual_rate.is_positive() {
        return principal / Decimal::from(months);
    }

    // A = P * r / (1 - (1 + r)^-n)
    let r = annual_rate.monthly_rate().as_decimal();
    let compound = compound_factor(r, months);
    let discount = Decimal::ONE - Decimal::ONE / compound;

    Money::from_decimal(principal.as_decimal() * r / discount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_rate_degrades_to_straight_line() {
        let payment = monthly_payment(Money::from_major(1_200), Rate::ZERO, 10);
        assert_eq!(payment, Money::from_major(10));
    }

    #[test]
    fn test_degenerate_loans_pay_nothing() {
        assert_eq!(monthly_payment(Money::ZERO, Rate::from_percentage(4), 30), Money::ZERO);
        assert_eq!(monthly_payment(Money::from_major(-100), Rate::from_percentage(4), 30), Money::ZERO);
        assert_eq!(monthly_payment(Money::from_major(100_000), Rate::from_percentage(4), 0), Money::ZERO);
        assert!(amortization_schedule(Money::from_major(100_000), Rate::from_percentage(4), 0).is_empty());
    }

    #[test]
    fn test_mortgage_payment() {
        let payment = monthly_payment(Money::from_major(187_500), Rate::from_percentage(4), 30);
        assert!((payment - Money::from_decimal(dec!(895.35))).abs() <= Money::ONE);
    }

    #[test]
    fn test_schedule_shape() {
        let principal = Money::from_major(100_000);
        let rate = Rate::from_percentage(12);
        let schedule = amortization_schedule(principal, rate, 1);

        assert_eq!(schedule.len(), 12);

        let first = &schedule[0];
        assert_eq!(first.month, 1);
        assert_eq!(first.interest_portion, Money::from_major(1_000));
        assert_eq!(first.payment, monthly_payment(principal, rate, 1));

        // interest declines as the balance is paid down
        for pair in schedule.windows(2) {
            assert!(pair[1].interest_portion <= pair[0].interest_portion);
            assert!(pair[1].remaining_balance <= pair[0].remaining_balance);
        }

        assert_eq!(schedule.last().unwrap().remaining_balance, Money::ZERO);
    }

    #[test]
    fn test_rows_add_up() {
        let schedule = amortization_schedule(Money::from_major(250_000), Rate::from_percentage(dec!(3.7)), 25);
        for row in &schedule {
            assert_eq!(row.principal_portion + row.interest_portion, row.payment);
        }
    }

    #[test]
    fn test_remaining_balance_at_term_is_zero() {
        let principal = Money::from_major(187_500);
        let rate = Rate::from_percentage(4);
        assert_eq!(remaining_balance(principal, rate, 30, 360), Money::ZERO);
        assert_eq!(remaining_balance(principal, rate, 30, 400), Money::ZERO);
        assert_eq!(remaining_balance(principal, rate, 30, 0), principal);
    }

    #[test]
    fn test_remaining_balance_matches_schedule() {
        let principal = Money::from_major(187_500);
        let rate = Rate::from_percentage(4);
        let schedule = amortization_schedule(principal, rate, 30);

        let closed_form = remaining_balance(principal, rate, 30, 120);
        let scheduled = schedule[119].remaining_balance;
        assert!((closed_form - scheduled).abs() < Money::ONE);
    }

    #[test]
    fn test_zero_rate_remaining_balance() {
        let principal = Money::from_major(1_200);
        assert_eq!(remaining_balance(principal, Rate::ZERO, 10, 30), Money::from_major(900));
        assert_eq!(remaining_balance(principal, Rate::ZERO, 10, 120), Money::ZERO);
    }

    #[test]
    fn test_months_to_repay() {
        let payoff = months_to_repay(Money::from_major(1_200), Rate::ZERO, Money::from_major(100), 360);
        assert_eq!(payoff.months, 12);
        assert!(!payoff.reached_cap);
        assert_eq!(payoff.interest_paid, Money::ZERO);

        // payment below the monthly interest never clears the debt
        let stuck = months_to_repay(Money::from_major(100_000), Rate::from_percentage(12), Money::from_major(500), 360);
        assert_eq!(stuck.months, 360);
        assert!(stuck.reached_cap);
    }

    #[test]
    fn test_extreme_rate_balance_stays_bounded() {
        let principal = Money::from_major(100_000);
        let rate = Rate::from_percentage(500);

        let balance = remaining_balance(principal, rate, 30, 300);
        assert!(!balance.is_negative());
        assert!(balance <= principal);
        assert_eq!(remaining_balance(principal, rate, 30, 0), principal);
        assert_eq!(remaining_balance(principal, rate, 30, 360), Money::ZERO);

        // at 500% almost every payment is interest, so the balance barely moves early on
        assert!(remaining_balance(principal, rate, 30, 12) > Money::from_major(99_000));
    }

    #[test]
    fn test_runaway_balance_stops_at_cap() {
        let payoff = months_to_repay(Money::from_major(100_000), Rate::from_percentage(500), Money::from_major(10), 2_000);
        assert!(payoff.reached_cap);
        assert!(payoff.months < 2_000);
    }

    proptest! {
        #[test]
        fn prop_schedule_closes(
            principal in 1_000i64..2_000_000,
            rate_bps in 0u32..=2_000,
            years in 5u32..=30,
        ) {
            let principal = Money::from_major(principal);
            let rate = Rate::from_bps(rate_bps);
            let schedule = amortization_schedule(principal, rate, years);

            prop_assert_eq!(schedule.len() as u32, years * 12);

            let last = schedule.last().unwrap();
            prop_assert!(last.remaining_balance.abs() <= Money::CENT);

            let repaid: Money = schedule.iter().map(|row| row.principal_portion).sum();
            prop_assert!((repaid - principal).abs() <= Money::CENT);

            for pair in schedule.windows(2) {
                prop_assert!(pair[1].remaining_balance <= pair[0].remaining_balance);
            }
        }

        #[test]
        fn prop_remaining_balance_closes(
            principal in 1_000i64..2_000_000,
            rate_bps in 0u32..=2_000,
            years in 1u32..=40,
        ) {
            let balance = remaining_balance(Money::from_major(principal), Rate::from_bps(rate_bps), years, years * 12);
            prop_assert_eq!(balance, Money::ZERO);
        }
    }
}
