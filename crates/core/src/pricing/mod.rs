//! Monetary calculations for quotations and financing.
//!
//! This module implements the pure pricing arithmetic:
//! - Line-item investment and sale-price derivation
//! - Quotation subtotal, tax, and sale total
//! - Financing surcharge and installment figures
//!
//! All amounts are `rust_decimal::Decimal` rounded to 2 decimal places at
//! each aggregation step so drift never accumulates across totals.

pub mod calculator;

#[cfg(test)]
mod props;

pub use calculator::{
    DEFAULT_INTEREST_RATE, FinancingFigures, PricingError, QuotationTotals, TAX_RATE,
    financed_sale_total, financing_figures, installment_amounts, installment_due_dates,
    line_item_figures, quotation_totals, round_money,
};
