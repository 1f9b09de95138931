//! Core domain types and logic.

pub mod allocation;
pub mod cancel;
pub mod config_validation;
pub mod date_range;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod ohlcv;
pub mod optimizer;
pub mod portfolio;
pub mod price_history;
pub mod symbols;
