//! Rule evaluation engine.
//!
//! Evaluates a strategy's named rules against the latest bars and the
//! computed indicator set.
//!
//! # Evaluation Semantics
//!
//! - Every rule is evaluated; there is no short-circuit on the first failure
//! - The outcome keeps declaration order so diagnostics read like the rule list
//! - An operand that cannot be resolved (unknown indicator, history too short
//!   for `CloseBarsAgo`) resolves to NaN, which compares false
//! - Overall pass is the logical AND of all outcomes

use crate::domain::indicator::IndicatorSet;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::rule::{Fact, Operand, Rule};

/// Scalar facts read from the tail of a bar series.
#[derive(Debug, Clone, Copy)]
pub struct MarketFacts<'a> {
    bars: &'a [OhlcvBar],
}

impl<'a> MarketFacts<'a> {
    /// Needs at least two bars so that the previous-bar facts exist.
    pub fn from_bars(bars: &'a [OhlcvBar]) -> Option<Self> {
        (bars.len() >= 2).then_some(Self { bars })
    }

    fn back(&self, n: usize) -> Option<&OhlcvBar> {
        let idx = self.bars.len().checked_sub(1 + n)?;
        self.bars.get(idx)
    }

    fn today(&self) -> &OhlcvBar {
        &self.bars[self.bars.len() - 1]
    }

    fn yesterday(&self) -> &OhlcvBar {
        &self.bars[self.bars.len() - 2]
    }

    pub fn last_close(&self) -> f64 {
        self.today().close
    }

    pub fn prev_close(&self) -> f64 {
        self.yesterday().close
    }

    pub fn volume_today(&self) -> f64 {
        self.today().volume as f64
    }

    pub fn prev_volume(&self) -> f64 {
        self.yesterday().volume as f64
    }

    pub fn high_today(&self) -> f64 {
        self.today().high
    }

    pub fn value_today(&self) -> f64 {
        self.today().traded_value()
    }

    /// Percent change from the previous close. A rise from 0 is `+inf`, and
    /// 0 to 0 is NaN, which fails every comparison.
    pub fn daily_change_pct(&self) -> f64 {
        (self.last_close() / self.prev_close() - 1.0) * 100.0
    }

    pub fn close_bars_ago(&self, n: usize) -> Option<f64> {
        self.back(n).map(|b| b.close)
    }

    pub fn as_of(&self) -> chrono::NaiveDate {
        self.today().date
    }

    pub fn get(&self, fact: Fact) -> Option<f64> {
        let value = match fact {
            Fact::LastClose => self.last_close(),
            Fact::PrevClose => self.prev_close(),
            Fact::CloseBarsAgo(n) => return self.close_bars_ago(n),
            Fact::VolumeToday => self.volume_today(),
            Fact::PrevVolume => self.prev_volume(),
            Fact::HighToday => self.high_today(),
            Fact::ValueToday => self.value_today(),
            Fact::DailyChangePct => self.daily_change_pct(),
        };
        Some(value)
    }
}

/// Rule name to result, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    entries: Vec<(String, bool)>,
}

impl RuleOutcome {
    pub fn passed(&self) -> bool {
        self.entries.iter().all(|(_, ok)| *ok)
    }

    pub fn failed(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ok)| *ok)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(n, ok)| (n.as_str(), *ok))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn evaluate(rules: &[Rule], facts: &MarketFacts<'_>, indicators: &IndicatorSet) -> RuleOutcome {
    let entries = rules
        .iter()
        .map(|rule| {
            let left = resolve_operand(&rule.left, facts, indicators);
            let right = resolve_operand(&rule.right, facts, indicators);
            (rule.name.clone(), rule.cmp.apply(left, right))
        })
        .collect();
    RuleOutcome { entries }
}

pub fn resolve_operand(operand: &Operand, facts: &MarketFacts<'_>, indicators: &IndicatorSet) -> f64 {
    match operand {
        Operand::Fact(fact) => facts.get(*fact).unwrap_or(f64::NAN),
        Operand::Indicator(name) => indicators.get(name).unwrap_or(f64::NAN),
        Operand::Constant(v) => *v,
        Operand::Scaled { factor, operand } => factor * resolve_operand(operand, facts, indicators),
    }
}
