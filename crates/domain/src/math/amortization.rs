//! Loan amortization tracking.
//!
//! Covers issuing a loan against collateral, applying monthly payments, and
//! the read-only derivations the borrower dashboard renders: payment
//! progress, the next due loan and portfolio aggregates.

use crate::entities::{CollateralToken, Loan, LoanId};
use crate::enums::PaymentFormula;
use crate::error::{LendingError, LendingResult};
use crate::metrics::reliability;
use crate::value_objects::{Money, Percent};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

/// Months per year, used to turn an APR into a monthly rate.
const MONTHS_PER_YEAR: u32 = 12;

/// Terms a borrower submits with a loan request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub amount: Money,
    pub duration_months: u32,
    /// APR on the 0-100 scale.
    pub annual_rate: Percent,
}

/// Lending rules applied when issuing and servicing loans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPolicy {
    /// How the monthly payment is derived.
    pub payment_formula: PaymentFormula,
    /// Lowest collateral reliability score that may borrow.
    pub min_reliability_score: u8,
    /// Days between due dates.
    pub payment_interval_days: i64,
    /// Longest term a request may ask for.
    pub max_duration_months: u32,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            payment_formula: PaymentFormula::default(),
            min_reliability_score: 70,
            payment_interval_days: 30,
            max_duration_months: 360,
        }
    }
}

/// Totals across a borrower's loans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanAggregate {
    /// Sum of principal.
    pub total_borrowed: Money,
    /// Sum of outstanding balances.
    pub outstanding: Money,
    /// Monthly payment of the primary (first) loan.
    pub monthly_payment: Money,
    /// Sum of monthly payments across active loans.
    pub total_monthly_payment: Money,
    /// Earliest due date, if any loan exists.
    pub next_due: Option<DateTime<Utc>>,
}

/// Percentage of scheduled payments made, in `[0, 100]`.
///
/// A loan with no scheduled payments reports zero.
pub fn progress(loan: &Loan) -> Percent {
    if loan.total_payments == 0 {
        return Percent::ZERO;
    }
    let made = loan.payments_made.min(loan.total_payments);
    Percent::ratio(Decimal::from(made), Decimal::from(loan.total_payments))
}

/// The loan with the earliest due date; ties go to the lowest id.
pub fn next_due_across_loans(loans: &[Loan]) -> Option<&Loan> {
    loans.iter().min_by_key(|loan| (loan.next_due_date, loan.id))
}

/// Aggregates a borrower's loans for display.
///
/// `monthly_payment` is the payment of the first loan in the slice's current
/// order, which for a session is the most recently requested loan.
pub fn aggregate(loans: &[Loan]) -> LendingResult<LoanAggregate> {
    Ok(LoanAggregate {
        total_borrowed: Money::checked_sum(loans.iter().map(|loan| loan.principal))?,
        outstanding: Money::checked_sum(loans.iter().map(|loan| loan.balance))?,
        monthly_payment: loans.first().map(|loan| loan.monthly_payment).unwrap_or(Money::ZERO),
        total_monthly_payment: Money::checked_sum(
            loans
                .iter()
                .filter(|loan| loan.is_active())
                .map(|loan| loan.monthly_payment),
        )?,
        next_due: next_due_across_loans(loans).map(|loan| loan.next_due_date),
    })
}

/// Monthly payment for a principal under the given formula.
///
/// The annuity form is `P * r / (1 - (1 + r)^-n)` with `r` the monthly rate;
/// a zero rate spreads principal evenly over the term. A term whose
/// compounding factor cannot be represented is an [`LendingError::InvalidTerm`].
pub fn monthly_payment(
    formula: PaymentFormula,
    principal: Money,
    annual_rate: Percent,
    duration_months: u32,
) -> LendingResult<Money> {
    if duration_months == 0 {
        return Err(LendingError::InvalidTerm);
    }
    if annual_rate.0.is_sign_negative() && !annual_rate.0.is_zero() {
        return Err(LendingError::InvalidRate);
    }

    match formula {
        PaymentFormula::FlatPercent(share) => principal
            .value()
            .checked_mul(share.as_fraction())
            .map(Money::saturating)
            .ok_or(LendingError::InvalidAmount),
        PaymentFormula::Annuity => {
            let months = Decimal::from(duration_months);
            let rate = annual_rate.as_fraction() / Decimal::from(MONTHS_PER_YEAR);
            if rate.is_zero() {
                return Ok(Money::saturating(principal.value() / months));
            }
            let growth = (Decimal::ONE + rate)
                .checked_powu(u64::from(duration_months))
                .ok_or(LendingError::InvalidTerm)?;
            principal
                .value()
                .checked_mul(rate)
                .and_then(|scaled| scaled.checked_mul(growth))
                .and_then(|scaled| scaled.checked_div(growth - Decimal::ONE))
                .map(Money::saturating)
                .ok_or(LendingError::InvalidAmount)
        }
    }
}

/// Checks that a collateral token may back a new loan.
pub fn check_collateral(collateral: &CollateralToken, policy: &LoanPolicy) -> LendingResult<()> {
    if !collateral.staked {
        return Err(LendingError::CollateralNotStaked(collateral.token_id));
    }
    reliability::tier_for_score(collateral.reliability_score)?;
    if collateral.reliability_score < policy.min_reliability_score {
        return Err(LendingError::CollateralIneligible {
            score: collateral.reliability_score,
            minimum: policy.min_reliability_score,
        });
    }
    Ok(())
}

/// Issues a new loan against a collateral token.
///
/// The loan starts with its full principal outstanding and its first
/// payment due one interval after `now`.
pub fn request_loan(
    collateral: &CollateralToken,
    request: &LoanRequest,
    policy: &LoanPolicy,
    id: LoanId,
    now: DateTime<Utc>,
) -> LendingResult<Loan> {
    if request.amount.is_zero() {
        return Err(LendingError::InvalidAmount);
    }
    if request.duration_months > policy.max_duration_months {
        return Err(LendingError::InvalidTerm);
    }
    check_collateral(collateral, policy)?;

    let payment = monthly_payment(
        policy.payment_formula,
        request.amount,
        request.annual_rate,
        request.duration_months,
    )?;

    Ok(Loan {
        id,
        collateral_token_id: collateral.token_id,
        principal: request.amount,
        balance: request.amount,
        annual_rate: request.annual_rate,
        monthly_payment: payment,
        next_due_date: now + Duration::days(policy.payment_interval_days),
        payments_made: 0,
        total_payments: request.duration_months,
    })
}

/// Applies a payment to a loan.
///
/// The month's interest on the outstanding balance is covered first and the
/// rest reduces the balance, which never goes below zero. The due date moves
/// forward one interval.
pub fn apply_payment(loan: &Loan, amount: Money, policy: &LoanPolicy) -> LendingResult<Loan> {
    if amount.is_zero() {
        return Err(LendingError::InvalidAmount);
    }
    if !loan.is_active() {
        return Err(LendingError::LoanClosed(loan.id.0));
    }

    let interest = loan
        .balance
        .value()
        .checked_mul(loan.annual_rate.as_fraction())
        .ok_or(LendingError::InvalidAmount)?
        / Decimal::from(MONTHS_PER_YEAR);
    let principal_part = Money::saturating(amount.value() - interest);

    let mut updated = loan.clone();
    updated.balance = loan.balance.saturating_sub(principal_part);
    updated.payments_made = (loan.payments_made + 1).min(loan.total_payments);
    updated.next_due_date = loan.next_due_date + Duration::days(policy.payment_interval_days);
    Ok(updated)
}
