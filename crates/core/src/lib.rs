//! Core business logic for Cotiza.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `pricing` - Monetary calculations for line items, taxes, and financing
//! - `quotation` - Quotation aggregate, validation, and lifecycle guards
//! - `payment` - Payment classification and reference derivation
//! - `statement` - Account statement balance and arrears rules

pub mod payment;
pub mod pricing;
pub mod quotation;
pub mod statement;
