//! Account statement rules: balances and moratory interest.
//!
//! The account statement is the independent running ledger kept per
//! financed quotation. This module holds the pure rules; persistence lives
//! in the database layer.

pub mod balance;

pub use balance::{
    Arrears, BalanceReversal, DEFAULT_MORATORY_DAILY_RATE, PaymentApplication, ReversalOvershoot,
    StatementStatus, accrue_arrears, apply_payment, reapply_delta,
};
