//! Core domain types and logic.

pub mod error;
pub mod indicator;
pub mod ledger;
pub mod metrics;
pub mod portfolio;
pub mod position;
pub mod price_series;
pub mod session_validation;
pub mod shared_ledger;
