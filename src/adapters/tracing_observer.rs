//! `ScreenObserver` that forwards engine events to `tracing`.

use crate::domain::error::SkipReason;
use crate::domain::format::format_magnitude;
use crate::domain::indicator::IndicatorSet;
use crate::domain::result::ScreenResult;
use crate::domain::rule_eval::{MarketFacts, RuleOutcome};
use crate::domain::strategy::Strategy;
use crate::ports::observer_port::ScreenObserver;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ScreenObserver for TracingObserver {
    fn on_rules(
        &self,
        ticker: &str,
        strategy: &Strategy,
        facts: &MarketFacts<'_>,
        indicators: &IndicatorSet,
        outcome: &RuleOutcome,
    ) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        debug!(
            ticker,
            strategy = %strategy.kind,
            close = %format!("{:.2}", facts.last_close()),
            volume = %format_magnitude(facts.volume_today()),
            value = %format_magnitude(facts.value_today()),
            change_pct = %format!("{:.2}", facts.daily_change_pct()),
            indicators = %render_indicators(indicators),
            rules = %render_outcome(outcome),
            "rules evaluated"
        );
    }

    fn on_skip(&self, ticker: &str, reason: &SkipReason) {
        debug!(ticker, kind = reason.kind(), "skipped: {}", reason);
    }

    fn on_pass(&self, result: &ScreenResult) {
        info!(ticker = %result.ticker, strategy = %result.strategy, "✓ {} passed", result.ticker);
    }
}

fn render_indicators(indicators: &IndicatorSet) -> String {
    indicators
        .iter()
        .map(|(name, value)| match value {
            Some(v) => format!("{}={:.2}", name, v),
            None => format!("{}=n/a", name),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_outcome(outcome: &RuleOutcome) -> String {
    outcome
        .iter()
        .map(|(name, ok)| format!("{}={}", name, ok))
        .collect::<Vec<_>>()
        .join(" ")
}
