use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::IrrConfig;
use crate::decimal::Money;

/// outcome of the Newton-Raphson search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrSolution {
    /// annual rate in percent, 2 dp
    pub rate_percent: Decimal,
    pub iterations: u32,
    /// false when the iteration cap, a flat derivative or an overflow stopped the search
    pub converged: bool,
}

impl IrrSolution {
    fn zero() -> Self {
        Self {
            rate_percent: Decimal::ZERO,
            iterations: 0,
            converged: true,
        }
    }
}

/// net present value of `cashflows` at `rate`, period index = position.
/// Returns None if a discount factor overflows.
pub fn npv(rate: Decimal, cashflows: &[Money]) -> Option<Decimal> {
    npv_and_derivative(rate, cashflows).map(|(value, _)| value)
}

/// internal rate of return in percent using the default solver settings
pub fn irr(cashflows: &[Money]) -> Decimal {
    solve_irr(cashflows, &IrrConfig::default()).rate_percent
}

/// Newton-Raphson on NPV(rate) = 0.
///
/// Series with more than one sign change can have several roots or none; the
/// solver returns whichever estimate it reaches. Non-convergence is reported on
/// the solution, not as an error.
pub fn solve_irr(cashflows: &[Money], config: &IrrConfig) -> IrrSolution {
    if cashflows.len() < 2 || !has_sign_change(cashflows) {
        return IrrSolution::zero();
    }

    let mut rate = clamp(config.initial_guess, config);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        let Some((value, derivative)) = npv_and_derivative(rate, cashflows) else {
            break;
        };

        if value.abs() < config.npv_tolerance {
            converged = true;
            break;
        }

        if derivative.abs() < config.derivative_epsilon {
            break;
        }

        let Some(step) = value.checked_div(derivative) else {
            break;
        };

        rate = clamp(rate - step, config);
        iterations += 1;
    }

    if !converged {
        log::warn!(
            "irr did not converge after {} iterations, best estimate {}",
            iterations,
            rate
        );
    }

    IrrSolution {
        rate_percent: (rate * Decimal::ONE_HUNDRED).round_dp(2),
        iterations,
        converged,
    }
}

/// NPV and dNPV/drate in one pass, discount factors built by repeated division
fn npv_and_derivative(rate: Decimal, cashflows: &[Money]) -> Option<(Decimal, Decimal)> {
    let base = Decimal::ONE + rate;
    if base <= Decimal::ZERO {
        return None;
    }

    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (period, cashflow) in cashflows.iter().enumerate() {
        let cf = cashflow.as_decimal();
        let term = cf.checked_mul(discount)?;
        value = value.checked_add(term)?;

        if period > 0 {
            // d/dr of cf / (1+r)^t is -t * cf / (1+r)^(t+1)
            let slope = term
                .checked_mul(Decimal::from(period as u64))?
                .checked_div(base)?;
            derivative = derivative.checked_sub(slope)?;
        }

        discount = discount.checked_div(base)?;
    }

    Some((value, derivative))
}

fn has_sign_change(cashflows: &[Money]) -> bool {
    cashflows.iter().any(|cf| cf.is_positive()) && cashflows.iter().any(|cf| cf.is_negative())
}

fn clamp(rate: Decimal, config: &IrrConfig) -> Decimal {
    rate.max(config.min_rate).min(config.max_rate)
}
