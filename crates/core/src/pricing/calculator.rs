//! Pure pricing functions.
//!
//! No I/O, no state. Every function rounds its result to 2 decimal places
//! using Banker's Rounding (`MidpointNearestEven`) so repeated recomputation
//! is idempotent.

use chrono::{Days, NaiveDate};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use thiserror::Error;

/// Sales tax rate applied to every quotation subtotal (16%).
pub const TAX_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 2);

/// Default financing interest rate applied to the sale total (34%).
pub const DEFAULT_INTEREST_RATE: Decimal = Decimal::from_parts(34, 0, 0, false, 2);

/// Errors that can occur during pricing calculations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// Financing term must be at least one week.
    #[error("financing term must be at least one week")]
    ZeroTerm,
}

/// Derived totals for a quotation's line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotationTotals {
    /// Sum of line-item sale prices.
    pub subtotal: Decimal,
    /// Tax on the subtotal.
    pub tax: Decimal,
    /// Subtotal plus tax.
    pub sale_total: Decimal,
}

/// Derived figures for a financed quotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinancingFigures {
    /// Balance left to pay after the down payment.
    pub remaining_balance: Decimal,
    /// Suggested weekly installment.
    pub weekly_payment: Decimal,
}

/// Round a monetary value to 2 decimal places using Banker's Rounding.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Derive a line item's investment total and sale price.
///
/// `investment_total = materials + labor` and
/// `sale_price = investment_total * (1 + profit_pct / 100)`, both rounded.
#[must_use]
pub fn line_item_figures(
    materials_cost: Decimal,
    labor_cost: Decimal,
    profit_pct: Decimal,
) -> (Decimal, Decimal) {
    let investment_total = round_money(materials_cost + labor_cost);
    let margin = Decimal::ONE + profit_pct / Decimal::ONE_HUNDRED;
    let sale_price = round_money(investment_total * margin);
    (investment_total, sale_price)
}

/// Derive a quotation's subtotal, tax, and sale total from its sale prices.
#[must_use]
pub fn quotation_totals(sale_prices: &[Decimal]) -> QuotationTotals {
    let subtotal = round_money(sale_prices.iter().copied().sum());
    let tax = round_money(subtotal * TAX_RATE);
    let sale_total = round_money(subtotal + tax);
    QuotationTotals {
        subtotal,
        tax,
        sale_total,
    }
}

/// Inflate a sale total by the financing interest rate.
#[must_use]
pub fn financed_sale_total(sale_total: Decimal, interest_rate: Decimal) -> Decimal {
    round_money(sale_total * (Decimal::ONE + interest_rate))
}

/// Derive the remaining balance and weekly payment for a financed quotation.
///
/// `financed_total` must already include the interest surcharge.
///
/// # Errors
///
/// Returns `PricingError::ZeroTerm` if `term_weeks` is zero. Callers are
/// expected to reject that input earlier; this guard only protects the
/// division.
pub fn financing_figures(
    financed_total: Decimal,
    down_payment: Decimal,
    term_weeks: u32,
) -> Result<FinancingFigures, PricingError> {
    if term_weeks == 0 {
        return Err(PricingError::ZeroTerm);
    }
    let remaining_balance = round_money(financed_total - down_payment);
    let weekly_payment = round_money(remaining_balance / Decimal::from(term_weeks));
    Ok(FinancingFigures {
        remaining_balance,
        weekly_payment,
    })
}

/// Installment amounts for a schedule of `term_weeks` payments.
///
/// All installments are `weekly_payment`; the final one absorbs the rounding
/// remainder so the schedule sums to exactly `remaining_balance`.
#[must_use]
pub fn installment_amounts(
    remaining_balance: Decimal,
    weekly_payment: Decimal,
    term_weeks: u32,
) -> Vec<Decimal> {
    if term_weeks == 0 {
        return Vec::new();
    }
    let head = weekly_payment * Decimal::from(term_weeks - 1);
    let mut amounts = vec![weekly_payment; term_weeks as usize];
    amounts[term_weeks as usize - 1] = round_money(remaining_balance - head);
    amounts
}

/// Due dates for a schedule of `term_weeks` weekly payments.
///
/// Installment `i` (1-indexed) is due `7 * i` days after `start`.
#[must_use]
pub fn installment_due_dates(start: NaiveDate, term_weeks: u32) -> Vec<NaiveDate> {
    (1..=u64::from(term_weeks))
        .map(|week| start + Days::new(7 * week))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_constants() {
        assert_eq!(TAX_RATE, dec!(0.16));
        assert_eq!(DEFAULT_INTEREST_RATE, dec!(0.34));
    }

    #[test]
    fn test_line_item_figures() {
        // materials=1000, labor=500, profit=10% -> investment=1500, sale=1650
        let (investment, sale) = line_item_figures(dec!(1000), dec!(500), dec!(10));
        assert_eq!(investment, dec!(1500.00));
        assert_eq!(sale, dec!(1650.00));
    }

    #[test]
    fn test_line_item_zero_profit() {
        let (investment, sale) = line_item_figures(dec!(250.50), dec!(100.25), dec!(0));
        assert_eq!(investment, dec!(350.75));
        assert_eq!(sale, dec!(350.75));
    }

    #[test]
    fn test_quotation_totals_scenario_a() {
        // Scenario: one item with sale_price=1650
        let totals = quotation_totals(&[dec!(1650)]);
        assert_eq!(totals.subtotal, dec!(1650.00));
        assert_eq!(totals.tax, dec!(264.00));
        assert_eq!(totals.sale_total, dec!(1914.00));
    }

    #[test]
    fn test_quotation_totals_empty() {
        let totals = quotation_totals(&[]);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.sale_total, Decimal::ZERO);
    }

    #[test]
    fn test_financed_sale_total() {
        assert_eq!(financed_sale_total(dec!(1000), dec!(0.34)), dec!(1340.00));
    }

    #[test]
    fn test_financing_figures_scenario_b() {
        // sale_total=1000 pre-interest, rate=0.34, down=100, term=10
        let financed = financed_sale_total(dec!(1000), dec!(0.34));
        let figures = financing_figures(financed, dec!(100), 10).unwrap();
        assert_eq!(figures.remaining_balance, dec!(1240.00));
        assert_eq!(figures.weekly_payment, dec!(124.00));
    }

    #[test]
    fn test_financing_figures_zero_term() {
        assert_eq!(
            financing_figures(dec!(1000), dec!(100), 0),
            Err(PricingError::ZeroTerm)
        );
    }

    #[test]
    fn test_installment_amounts_uniform() {
        let amounts = installment_amounts(dec!(1240.00), dec!(124.00), 10);
        assert_eq!(amounts.len(), 10);
        assert!(amounts.iter().all(|a| *a == dec!(124.00)));
    }

    #[test]
    fn test_installment_amounts_remainder_in_last() {
        // 1000 / 3 = 333.33; last installment covers the 0.01 remainder
        let figures = financing_figures(dec!(1000), dec!(0), 3).unwrap();
        assert_eq!(figures.weekly_payment, dec!(333.33));
        let amounts = installment_amounts(figures.remaining_balance, figures.weekly_payment, 3);
        assert_eq!(amounts, vec![dec!(333.33), dec!(333.33), dec!(333.34)]);
        let sum: Decimal = amounts.iter().copied().sum();
        assert_eq!(sum, dec!(1000.00));
    }

    #[test]
    fn test_installment_due_dates() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let dates = installment_due_dates(start, 3);
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2026, 1, 8).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 22).unwrap(),
            ]
        );
    }

    #[test]
    fn test_round_money_bankers() {
        assert_eq!(round_money(dec!(2.125)), dec!(2.12));
        assert_eq!(round_money(dec!(2.135)), dec!(2.14));
    }
}
