//! Property-based tests for the pricing calculator.
//!
//! - Schedules always sum to exactly the remaining balance
//! - Recomputing figures from the same inputs is idempotent
//! - Sale prices never fall below investment for non-negative margins

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::calculator::{
    financed_sale_total, financing_figures, installment_amounts, line_item_figures,
    quotation_totals, round_money,
};

/// Strategy to generate monetary amounts (0.00 to 100,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate profit percentages (0% to 200%).
fn profit_pct() -> impl Strategy<Value = Decimal> {
    (0i64..20_000i64).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

/// Strategy to generate interest rates (0.00 to 1.00).
fn interest_rate() -> impl Strategy<Value = Decimal> {
    (0i64..100i64).prop_map(|pct| Decimal::new(pct, 2))
}

proptest! {
    #[test]
    fn schedule_sums_to_remaining_balance(
        total in amount(),
        rate in interest_rate(),
        term in 1u32..520,
    ) {
        let financed = financed_sale_total(total, rate);
        // Down payment bounded by the financed total
        let down = round_money(financed / Decimal::TWO);
        let figures = financing_figures(financed, down, term).unwrap();
        let amounts = installment_amounts(figures.remaining_balance, figures.weekly_payment, term);

        prop_assert_eq!(amounts.len(), term as usize);
        let sum: Decimal = amounts.iter().copied().sum();
        prop_assert_eq!(sum, figures.remaining_balance);
    }

    #[test]
    fn line_item_sale_covers_investment(
        materials in amount(),
        labor in amount(),
        profit in profit_pct(),
    ) {
        let (investment, sale) = line_item_figures(materials, labor, profit);
        prop_assert_eq!(investment, materials + labor);
        // Rounding can shave at most half a cent off the margin
        prop_assert!(sale >= investment - Decimal::new(1, 2));
    }

    #[test]
    fn totals_are_idempotent(prices in proptest::collection::vec(amount(), 0..20)) {
        let first = quotation_totals(&prices);
        let second = quotation_totals(&[first.subtotal]);
        // Re-aggregating the rounded subtotal leaves it unchanged
        prop_assert_eq!(second.subtotal, first.subtotal);
        prop_assert_eq!(second.tax, first.tax);
        prop_assert_eq!(second.sale_total, first.sale_total);
    }

    #[test]
    fn financing_is_idempotent(
        total in amount(),
        rate in interest_rate(),
        term in 1u32..520,
    ) {
        let financed = financed_sale_total(total, rate);
        let a = financing_figures(financed, Decimal::ZERO, term).unwrap();
        let b = financing_figures(financed, Decimal::ZERO, term).unwrap();
        prop_assert_eq!(a, b);
        prop_assert_eq!(round_money(a.remaining_balance), a.remaining_balance);
    }
}
