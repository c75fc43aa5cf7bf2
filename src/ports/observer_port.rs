//! Observability port for the screening engine.
//!
//! The engine reports what it did through this trait instead of printing, so
//! callers choose where diagnostics go and tests can record them.

use crate::domain::error::SkipReason;
use crate::domain::indicator::IndicatorSet;
use crate::domain::result::ScreenResult;
use crate::domain::rule_eval::{MarketFacts, RuleOutcome};
use crate::domain::strategy::Strategy;

pub trait ScreenObserver {
    /// Called once per ticker whose rules were evaluated, pass or fail.
    fn on_rules(
        &self,
        _ticker: &str,
        _strategy: &Strategy,
        _facts: &MarketFacts<'_>,
        _indicators: &IndicatorSet,
        _outcome: &RuleOutcome,
    ) {
    }

    fn on_skip(&self, _ticker: &str, _reason: &SkipReason) {}

    fn on_pass(&self, _result: &ScreenResult) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ScreenObserver for NullObserver {}
