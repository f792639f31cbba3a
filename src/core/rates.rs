//! Effective global rate (TEG) calculators
//!
//! One function per product type. Inputs are already-normalized amounts,
//! durations and fractional rates; outputs are percentages wrapped in
//! [`RateOutcome`], which records *why* a rate could not be computed instead
//! of silently returning zero.

use crate::types::{DegenerateReason, RateOutcome};

/// Day-count basis for short-term products
pub const DAY_COUNT_BASIS: f64 = 360.0;

const SOLVER_TOLERANCE: f64 = 1e-10;
const SOLVER_MAX_ITERATIONS: usize = 200;
/// Lowest periodic rate the solver will consider
const SOLVER_RATE_FLOOR: f64 = -0.99;
const SOLVER_RATE_CEILING: f64 = 1e6;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn finite(value: f64, decimals: i32) -> RateOutcome {
    if value.is_finite() {
        RateOutcome::Computed(round_to(value, decimals))
    } else {
        RateOutcome::Degenerate(DegenerateReason::NotFinite)
    }
}

//==============================================================================
// Annuity rate solver
//==============================================================================

/// Present value of `periods` payments of `payment` at periodic rate `rate`
fn annuity_present_value(rate: f64, periods: f64, payment: f64) -> f64 {
    if rate.abs() < 1e-12 {
        payment * periods
    } else {
        payment * (1.0 - (1.0 + rate).powf(-periods)) / rate
    }
}

/// Derivative of [`annuity_present_value`] with respect to the rate
fn annuity_present_value_slope(rate: f64, periods: f64, payment: f64) -> f64 {
    if rate.abs() < 1e-12 {
        -payment * periods * (periods + 1.0) / 2.0
    } else {
        let discount = (1.0 + rate).powf(-periods);
        payment * (periods * discount / (1.0 + rate) - (1.0 - discount) / rate) / rate
    }
}

/// Periodic rate `r` such that `periods` payments of `payment` are worth
/// `present_value` today, with nothing left at the end.
///
/// Newton–Raphson from a 1% guess; falls back to bisection when Newton leaves
/// the rate domain or stalls. The present value is strictly decreasing in the
/// rate, so the bracket always holds a single root when one exists.
pub fn solve_annuity_rate(periods: f64, payment: f64, present_value: f64) -> Option<f64> {
    if periods <= 0.0 || payment <= 0.0 || present_value <= 0.0 {
        return None;
    }

    let residual = |r: f64| annuity_present_value(r, periods, payment) - present_value;

    let mut rate = 0.01;
    for _ in 0..SOLVER_MAX_ITERATIONS {
        let value = residual(rate);
        let slope = annuity_present_value_slope(rate, periods, payment);
        if !value.is_finite() || !slope.is_finite() || slope == 0.0 {
            break;
        }
        let next = rate - value / slope;
        if !next.is_finite() || next <= SOLVER_RATE_FLOOR {
            break;
        }
        if (next - rate).abs() < SOLVER_TOLERANCE {
            return Some(next);
        }
        rate = next;
    }

    bisect(residual)
}

fn bisect<F: Fn(f64) -> f64>(residual: F) -> Option<f64> {
    let mut low = SOLVER_RATE_FLOOR;
    let mut high = 1.0;

    // residual is decreasing: positive at the floor, negative past the root
    if residual(low) < 0.0 {
        return None;
    }
    while residual(high) > 0.0 {
        high *= 2.0;
        if high > SOLVER_RATE_CEILING {
            return None;
        }
    }

    for _ in 0..SOLVER_MAX_ITERATIONS {
        let mid = (low + high) / 2.0;
        let value = residual(mid);
        if value.abs() < SOLVER_TOLERANCE || (high - low) / 2.0 < SOLVER_TOLERANCE {
            return Some(mid);
        }
        if value > 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }
    Some((low + high) / 2.0)
}

//==============================================================================
// Amortizing credit
//==============================================================================

/// Inputs of the amortizing credit calculation
#[derive(Debug, Clone, Copy, Default)]
pub struct AmortizingInputs {
    pub principal: f64,
    pub duration_periods: i64,
    pub installment: f64,
    pub origination_fee: f64,
    pub insurance: f64,
    pub ancillary_fees: f64,
}

/// Periodic and annualized rates of an amortizing credit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmortizingRates {
    pub periodic: RateOutcome,
    pub annualized: RateOutcome,
}

/// Number of repayment periods per year for a free-text frequency.
///
/// Accepts the template codes `1`–`5` and French or English words;
/// anything else is treated as monthly.
pub fn frequency_multiplier(frequency: &str) -> u32 {
    let f = frequency.trim().to_lowercase();
    match f.as_str() {
        "1" => return 12,
        "2" => return 4,
        "3" => return 2,
        "4" => return 1,
        "5" => return 52,
        _ => {}
    }

    if f.contains("heb") || f.contains("week") {
        52
    } else if f.contains("semestr") || f.contains("semi") {
        2
    } else if f.contains("trimestr") || f.contains("quarter") {
        4
    } else if f.contains("mensuel") || f.contains("mois") || f.contains("month") {
        12
    } else if f.contains("annuel") || f.contains("annual") || f.contains("year") {
        1
    } else {
        12
    }
}

pub fn amortizing_credit_rate(inputs: &AmortizingInputs, frequency: &str) -> AmortizingRates {
    let degenerate = |reason| AmortizingRates {
        periodic: RateOutcome::Degenerate(reason),
        annualized: RateOutcome::Degenerate(reason),
    };

    if inputs.duration_periods <= 0 {
        return degenerate(DegenerateReason::ZeroDuration);
    }
    if inputs.principal == 0.0 {
        return degenerate(DegenerateReason::ZeroPrincipal);
    }
    if inputs.installment == 0.0 {
        return degenerate(DegenerateReason::MissingInstallment);
    }

    let net_principal =
        inputs.principal - inputs.origination_fee - inputs.insurance - inputs.ancillary_fees;
    if net_principal <= 0.0 {
        return degenerate(DegenerateReason::NonPositiveNetAmount);
    }

    let Some(rate) =
        solve_annuity_rate(inputs.duration_periods as f64, inputs.installment, net_principal)
    else {
        return degenerate(DegenerateReason::NoConvergence);
    };

    let periodic = rate * 100.0;
    let annualized = periodic * f64::from(frequency_multiplier(frequency));
    AmortizingRates {
        periodic: finite(periodic, 4),
        annualized: finite(annualized, 2),
    }
}

//==============================================================================
// Short-term products
//==============================================================================

/// `((principal × nominal) + fees) / principal × 100`
pub fn overdraft_rate(principal: f64, nominal_rate: f64, fees: &[f64]) -> RateOutcome {
    if principal == 0.0 {
        return RateOutcome::Degenerate(DegenerateReason::ZeroPrincipal);
    }
    let total_fees: f64 = fees.iter().sum();
    finite((principal * nominal_rate + total_fees) / principal * 100.0, 2)
}

/// `(fees / receivable) × (360 / days) × 100`
pub fn factoring_rate(receivable: f64, duration_days: i64, fees: &[f64]) -> RateOutcome {
    if receivable == 0.0 {
        return RateOutcome::Degenerate(DegenerateReason::ZeroPrincipal);
    }
    if duration_days == 0 {
        return RateOutcome::Degenerate(DegenerateReason::ZeroDuration);
    }
    let total_fees: f64 = fees.iter().sum();
    let days = duration_days as f64;
    finite(total_fees / receivable * (DAY_COUNT_BASIS / days) * 100.0, 2)
}

/// Cost of the guarantee over its life, re-annualized on the net amount
pub fn guarantee_rate(
    amount: f64,
    duration_days: i64,
    guarantee_rate: f64,
    commission_fees: f64,
    ancillary_fees: f64,
) -> RateOutcome {
    if amount == 0.0 {
        return RateOutcome::Degenerate(DegenerateReason::ZeroPrincipal);
    }
    if duration_days == 0 {
        return RateOutcome::Degenerate(DegenerateReason::ZeroDuration);
    }
    let net = amount - commission_fees - ancillary_fees;
    if net == 0.0 {
        return RateOutcome::Degenerate(DegenerateReason::NonPositiveNetAmount);
    }
    let days = duration_days as f64;
    let cost = amount * guarantee_rate * days / DAY_COUNT_BASIS;
    finite(cost / net * (DAY_COUNT_BASIS / days) * 100.0, 2)
}

/// Discount interest on the face amount, re-annualized on the net amount
pub fn commercial_paper_rate(
    face_amount: f64,
    duration_days: i64,
    nominal_rate: f64,
    commission: f64,
    other_fees: f64,
) -> RateOutcome {
    if face_amount == 0.0 {
        return RateOutcome::Degenerate(DegenerateReason::ZeroPrincipal);
    }
    if duration_days == 0 {
        return RateOutcome::Degenerate(DegenerateReason::ZeroDuration);
    }
    let net = face_amount - commission - other_fees;
    if net == 0.0 {
        return RateOutcome::Degenerate(DegenerateReason::NonPositiveNetAmount);
    }
    let days = duration_days as f64;
    let interest = nominal_rate * face_amount * days / DAY_COUNT_BASIS;
    finite(interest / net * (DAY_COUNT_BASIS / days) * 100.0, 2)
}

/// Single-repayment credit: simple periodic rate plus up-front charges
pub fn spot_credit_rate(
    principal: f64,
    duration_months: i64,
    installment: f64,
    charges: &[f64],
) -> RateOutcome {
    if principal == 0.0 {
        return RateOutcome::Degenerate(DegenerateReason::ZeroPrincipal);
    }
    if duration_months == 0 {
        return RateOutcome::Degenerate(DegenerateReason::ZeroDuration);
    }
    let periodic = (installment / principal - 1.0) * 12.0 / duration_months as f64;
    let charge_ratio = charges.iter().sum::<f64>() / principal;
    finite((periodic + charge_ratio) * 100.0, 2)
}
