//! Shared types, errors, and configuration for Cotiza.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy
//! - Configuration management
//! - JWT claims and token validation
//! - Pagination types for list endpoints

pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
