//! Statement balance application and arrears accrual.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::round_money;

/// Default moratory daily rate on overdue balances (1% per day).
pub const DEFAULT_MORATORY_DAILY_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Lifecycle status of an account statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementStatus {
    /// Balance outstanding, payments up to date.
    Active,
    /// Balance outstanding past the due date.
    InArrears,
    /// Balance paid down to zero.
    Settled,
    /// Financing called off.
    Cancelled,
    /// Under administrative review.
    InProcess,
}

impl StatementStatus {
    /// Returns true once no further balance movement is expected.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Settled | Self::Cancelled)
    }
}

/// Result of applying a payment to a running balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentApplication {
    /// Balance after the payment, clamped at zero.
    pub new_balance: Decimal,
    /// True when the payment drove the balance to zero.
    pub settled: bool,
}

/// Applies a payment to a running balance.
///
/// The balance never goes negative: an overshoot is clamped to zero and
/// reported as settlement.
#[must_use]
pub fn apply_payment(current_balance: Decimal, amount: Decimal) -> PaymentApplication {
    let raw = round_money(current_balance - amount);
    let new_balance = raw.max(Decimal::ZERO);
    PaymentApplication {
        new_balance,
        settled: new_balance <= Decimal::ZERO,
    }
}

/// A balance reversal that would drive the balance negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("reversal exceeds the remaining balance of {remaining}")]
pub struct ReversalOvershoot {
    /// Balance before the rejected reversal.
    pub remaining: Decimal,
}

/// Outcome of re-applying a payment delta after an edit or deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceReversal {
    /// Balance after the delta is applied.
    pub new_balance: Decimal,
    /// True when a service that completed through settlement must reopen.
    pub reopen_quotation: bool,
    /// Statement status after the delta is applied.
    pub statement_status: StatementStatus,
}

/// Re-applies a payment delta to a running balance after the payment was
/// edited or deleted.
///
/// A positive delta restores balance (the payment shrank or went away); a
/// negative delta consumes more of it. Restored balance on a service that
/// completed through settlement reopens it, and a closed statement returns
/// to active.
///
/// # Errors
///
/// Returns `ReversalOvershoot` when the delta would drive the balance
/// negative.
pub fn reapply_delta(
    current_balance: Decimal,
    delta: Decimal,
    service_completed: bool,
    statement_status: StatementStatus,
) -> Result<BalanceReversal, ReversalOvershoot> {
    let new_balance = round_money(current_balance + delta);
    if new_balance < Decimal::ZERO {
        return Err(ReversalOvershoot {
            remaining: current_balance,
        });
    }
    let statement_status = if new_balance <= Decimal::ZERO {
        StatementStatus::Settled
    } else if statement_status.is_closed() {
        StatementStatus::Active
    } else {
        statement_status
    };
    Ok(BalanceReversal {
        new_balance,
        reopen_quotation: new_balance > Decimal::ZERO && service_completed,
        statement_status,
    })
}

/// Moratory interest figures for an overdue statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrears {
    /// Whole days past the due date.
    pub days_in_arrears: i64,
    /// Accrued moratory interest.
    pub moratory_interest: Decimal,
}

/// Computes arrears from scratch for the given day.
///
/// Recomputing rather than accumulating keeps the call idempotent: running
/// it twice on the same day yields the same figures.
#[must_use]
pub fn accrue_arrears(
    due_date: NaiveDate,
    today: NaiveDate,
    current_balance: Decimal,
    daily_rate: Decimal,
) -> Arrears {
    let days = (today - due_date).num_days();
    if days <= 0 || current_balance <= Decimal::ZERO {
        return Arrears {
            days_in_arrears: 0,
            moratory_interest: Decimal::ZERO,
        };
    }
    Arrears {
        days_in_arrears: days,
        moratory_interest: round_money(Decimal::from(days) * current_balance * daily_rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_daily_rate() {
        assert_eq!(DEFAULT_MORATORY_DAILY_RATE, dec!(0.01));
    }

    #[test]
    fn test_apply_payment_partial() {
        let result = apply_payment(dec!(1240.00), dec!(124.00));
        assert_eq!(result.new_balance, dec!(1116.00));
        assert!(!result.settled);
    }

    #[test]
    fn test_apply_payment_exact_settles() {
        let result = apply_payment(dec!(124.00), dec!(124.00));
        assert_eq!(result.new_balance, Decimal::ZERO);
        assert!(result.settled);
    }

    #[test]
    fn test_apply_payment_overshoot_clamps_to_zero() {
        let result = apply_payment(dec!(100.00), dec!(150.00));
        assert_eq!(result.new_balance, Decimal::ZERO);
        assert!(result.settled);
    }

    #[test]
    fn test_sequence_of_payments_matches_sum() {
        let mut balance = dec!(1240.00);
        for _ in 0..10 {
            balance = apply_payment(balance, dec!(124.00)).new_balance;
        }
        assert_eq!(balance, Decimal::ZERO);
    }

    #[test]
    fn test_reapply_delta_deleted_payment_reopens_settled_state() {
        // A 124.00 payment deleted from a settled account restores balance
        let result =
            reapply_delta(Decimal::ZERO, dec!(124.00), true, StatementStatus::Settled).unwrap();
        assert_eq!(result.new_balance, dec!(124.00));
        assert!(result.reopen_quotation);
        assert_eq!(result.statement_status, StatementStatus::Active);
    }

    #[test]
    fn test_reapply_delta_keeps_open_status() {
        let result =
            reapply_delta(dec!(500.00), dec!(24.00), false, StatementStatus::InArrears).unwrap();
        assert_eq!(result.new_balance, dec!(524.00));
        assert!(!result.reopen_quotation);
        assert_eq!(result.statement_status, StatementStatus::InArrears);
    }

    #[test]
    fn test_reapply_delta_grown_payment_settles() {
        // The payment grew by the whole remaining balance
        let result =
            reapply_delta(dec!(100.00), dec!(-100.00), false, StatementStatus::Active).unwrap();
        assert_eq!(result.new_balance, Decimal::ZERO);
        assert!(!result.reopen_quotation);
        assert_eq!(result.statement_status, StatementStatus::Settled);
    }

    #[test]
    fn test_reapply_delta_rejects_overshoot() {
        let err = reapply_delta(dec!(100.00), dec!(-150.00), false, StatementStatus::Active)
            .unwrap_err();
        assert_eq!(err.remaining, dec!(100.00));
    }

    #[test]
    fn test_accrue_arrears_not_due_yet() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 2, 20).unwrap();
        let arrears = accrue_arrears(due, today, dec!(500), DEFAULT_MORATORY_DAILY_RATE);
        assert_eq!(arrears.days_in_arrears, 0);
        assert_eq!(arrears.moratory_interest, Decimal::ZERO);
    }

    #[test]
    fn test_accrue_arrears_overdue() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        // 10 days * 500.00 * 1% = 50.00
        let arrears = accrue_arrears(due, today, dec!(500), DEFAULT_MORATORY_DAILY_RATE);
        assert_eq!(arrears.days_in_arrears, 10);
        assert_eq!(arrears.moratory_interest, dec!(50.00));
    }

    #[test]
    fn test_accrue_arrears_is_idempotent() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        let first = accrue_arrears(due, today, dec!(500), DEFAULT_MORATORY_DAILY_RATE);
        let second = accrue_arrears(due, today, dec!(500), DEFAULT_MORATORY_DAILY_RATE);
        assert_eq!(first, second);
    }

    #[test]
    fn test_accrue_arrears_settled_balance() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        let arrears = accrue_arrears(due, today, Decimal::ZERO, DEFAULT_MORATORY_DAILY_RATE);
        assert_eq!(arrears.days_in_arrears, 0);
        assert_eq!(arrears.moratory_interest, Decimal::ZERO);
    }

    #[test]
    fn test_statement_status_is_closed() {
        assert!(StatementStatus::Settled.is_closed());
        assert!(StatementStatus::Cancelled.is_closed());
        assert!(!StatementStatus::Active.is_closed());
        assert!(!StatementStatus::InArrears.is_closed());
        assert!(!StatementStatus::InProcess.is_closed());
    }
}
