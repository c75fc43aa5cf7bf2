//! Core domain types and screening logic.

pub mod ohlcv;
pub mod indicator;
pub mod rule;
pub mod rule_eval;
pub mod strategy;
pub mod result;
pub mod format;
pub mod screener;
pub mod universe;
pub mod config_validation;
pub mod error;
