//! Strategy configuration and composition.
//!
//! A [`Strategy`] is plain data: the windows to compute, the named rules to
//! evaluate, the minimum history, and the columns to report. The engine in
//! [`crate::domain::screener`] runs any of them the same way.

use crate::domain::indicator::{Alignment, PriceField, WindowSpec};
use crate::domain::result::ColumnSpec;
use crate::domain::rule::{extract_indicators, Fact, Operand, Rule};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Variant L: liquidity, trend, price filter, momentum.
    LiquidityTrend,
    /// Variant S: two-stage trend plus strength.
    TwoStage,
    /// Variant G: price-gap breakout.
    PriceGap,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::LiquidityTrend,
        StrategyKind::TwoStage,
        StrategyKind::PriceGap,
    ];

    pub fn code(self) -> &'static str {
        match self {
            StrategyKind::LiquidityTrend => "L",
            StrategyKind::TwoStage => "S",
            StrategyKind::PriceGap => "G",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            StrategyKind::LiquidityTrend => "liquidity_trend",
            StrategyKind::TwoStage => "two_stage",
            StrategyKind::PriceGap => "price_gap",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        StrategyKind::ALL
            .into_iter()
            .find(|k| normalized == k.code().to_lowercase() || normalized == k.slug())
            .ok_or_else(|| format!("unknown strategy '{}' (expected L, S or G)", s.trim()))
    }
}

#[derive(Debug, Clone)]
pub struct Strategy {
    pub kind: StrategyKind,
    pub name: String,
    pub description: String,
    /// Months of daily bars to request from the data port.
    pub lookback_months: u32,
    pub min_history: usize,
    pub indicators: Vec<WindowSpec>,
    pub rules: Vec<Rule>,
    pub columns: Vec<ColumnSpec>,
    /// Column the aggregated results are sorted by, descending.
    pub sort_by: String,
}

impl Strategy {
    pub fn for_kind(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::LiquidityTrend => Self::liquidity_trend(),
            StrategyKind::TwoStage => Self::two_stage(),
            StrategyKind::PriceGap => Self::price_gap(),
        }
    }

    pub fn liquidity_trend() -> Self {
        Strategy {
            kind: StrategyKind::LiquidityTrend,
            name: "Liquidity / Trend / Momentum".into(),
            description: "High average volume, close above MA20 and above 50, higher than 5 bars ago"
                .into(),
            lookback_months: 3,
            min_history: 25,
            indicators: vec![
                WindowSpec::new("avg_volume_20d", PriceField::Volume, 20, Alignment::Current),
                WindowSpec::new("ma20", PriceField::Close, 20, Alignment::Current),
            ],
            rules: vec![
                Rule::above(
                    "liquidity",
                    Operand::indicator("avg_volume_20d"),
                    100_000_000.0,
                ),
                Rule::above("trend", Fact::LastClose, Operand::indicator("ma20")),
                Rule::above("price_filter", Fact::LastClose, 50.0),
                Rule::above("momentum", Fact::LastClose, Fact::CloseBarsAgo(5)),
            ],
            columns: vec![
                ColumnSpec::count("avg_volume", Operand::indicator("avg_volume_20d")),
                ColumnSpec::magnitude("avg_volume_fmt", Operand::indicator("avg_volume_20d")),
                ColumnSpec::decimal("last_close", Fact::LastClose),
                ColumnSpec::decimal("ma20", Operand::indicator("ma20")),
                ColumnSpec::difference("momentum_5d", Fact::LastClose, Fact::CloseBarsAgo(5)),
            ],
            sort_by: "avg_volume".into(),
        }
    }

    pub fn two_stage() -> Self {
        Strategy {
            kind: StrategyKind::TwoStage,
            name: "Two-Stage Trend + Strength".into(),
            description: "Liquid money inflow, MA5 over MA20, volume above its prior 5-day \
                          average, up more than 1% and closing near the high"
                .into(),
            lookback_months: 3,
            min_history: 25,
            indicators: vec![
                WindowSpec::new("ma5", PriceField::Close, 5, Alignment::Current),
                WindowSpec::new("ma20", PriceField::Close, 20, Alignment::Current),
                WindowSpec::new("avg_volume_5d", PriceField::Volume, 5, Alignment::Prior),
            ],
            rules: vec![
                Rule::above("volume_today_10m", Fact::VolumeToday, 10_000_000.0),
                Rule::above("value_today_10b", Fact::ValueToday, 10_000_000_000.0),
                Rule::above("close_above_ma5", Fact::LastClose, Operand::indicator("ma5")),
                Rule::above(
                    "ma5_above_ma20",
                    Operand::indicator("ma5"),
                    Operand::indicator("ma20"),
                ),
                Rule::above(
                    "volume_momentum",
                    Fact::VolumeToday,
                    Operand::indicator("avg_volume_5d"),
                ),
                Rule::above("daily_change_min_1pct", Fact::DailyChangePct, 1.0),
                Rule::above(
                    "close_near_high",
                    Fact::LastClose,
                    Operand::scaled(0.97, Fact::HighToday.into()),
                ),
            ],
            columns: vec![
                ColumnSpec::decimal("close", Fact::LastClose),
                ColumnSpec::decimal("ma5", Operand::indicator("ma5")),
                ColumnSpec::decimal("ma20", Operand::indicator("ma20")),
                ColumnSpec::count("volume_today", Fact::VolumeToday),
                ColumnSpec::magnitude("volume_today_fmt", Fact::VolumeToday),
                ColumnSpec::count("avg_volume_5d", Operand::indicator("avg_volume_5d")),
                ColumnSpec::magnitude("avg_volume_5d_fmt", Operand::indicator("avg_volume_5d")),
                ColumnSpec::count("value_today", Fact::ValueToday),
                ColumnSpec::magnitude("value_today_fmt", Fact::ValueToday),
                ColumnSpec::decimal("daily_change_pct", Fact::DailyChangePct),
            ],
            sort_by: "value_today".into(),
        }
    }

    pub fn price_gap() -> Self {
        Strategy {
            kind: StrategyKind::PriceGap,
            name: "Price-Gap Breakout".into(),
            description: "Close gaps more than 8% above the previous close on a volume spike, \
                          in an MA20-over-MA50 uptrend"
                .into(),
            lookback_months: 4,
            min_history: 60,
            indicators: vec![
                WindowSpec::new("ma20", PriceField::Close, 20, Alignment::Current),
                WindowSpec::new("ma50", PriceField::Close, 50, Alignment::Current),
                WindowSpec::new("avg_volume_20d", PriceField::Volume, 20, Alignment::Current),
            ],
            rules: vec![
                Rule::at_least("price_min_100", Fact::LastClose, 100.0),
                Rule::at_least("value_min_5b", Fact::ValueToday, 5_000_000_000.0),
                Rule::at_least("volume_min_10m", Fact::VolumeToday, 10_000_000.0),
                Rule::at_least("price_above_ma20", Fact::LastClose, Operand::indicator("ma20")),
                Rule::above(
                    "ma20_above_ma50",
                    Operand::indicator("ma20"),
                    Operand::indicator("ma50"),
                ),
                Rule::above(
                    "volume_spike",
                    Fact::VolumeToday,
                    Operand::scaled(1.5, Fact::PrevVolume.into()),
                ),
                Rule::above(
                    "price_gap_8pct",
                    Fact::LastClose,
                    Operand::scaled(1.08, Fact::PrevClose.into()),
                ),
                Rule::above(
                    "volume_above_ma20",
                    Fact::VolumeToday,
                    Operand::indicator("avg_volume_20d"),
                ),
            ],
            columns: vec![
                ColumnSpec::decimal("close", Fact::LastClose),
                ColumnSpec::decimal("ma20", Operand::indicator("ma20")),
                ColumnSpec::decimal("ma50", Operand::indicator("ma50")),
                ColumnSpec::count("volume_today", Fact::VolumeToday),
                ColumnSpec::magnitude("volume_today_fmt", Fact::VolumeToday),
                ColumnSpec::count("value_today", Fact::ValueToday),
                ColumnSpec::magnitude("value_today_fmt", Fact::ValueToday),
                ColumnSpec::decimal("price_change_pct", Fact::DailyChangePct),
            ],
            sort_by: "value_today".into(),
        }
    }

    /// Returns a copy with the named window's alignment replaced.
    pub fn with_alignment(mut self, indicator: &str, alignment: Alignment) -> Self {
        for spec in self.indicators.iter_mut().filter(|s| s.name == indicator) {
            spec.alignment = alignment;
        }
        self
    }

    pub fn indicator(&self, name: &str) -> Option<&WindowSpec> {
        self.indicators.iter().find(|s| s.name == name)
    }

    /// Checks internal consistency: every indicator a rule reads is declared,
    /// the declared windows fit within the minimum history, and the sort
    /// column exists.
    pub fn validate(&self) -> Result<(), String> {
        for name in extract_indicators(&self.rules) {
            if self.indicator(&name).is_none() {
                return Err(format!("rule references undeclared indicator {}", name));
            }
        }
        if let Some(spec) = self
            .indicators
            .iter()
            .find(|s| s.required_bars() > self.min_history)
        {
            return Err(format!(
                "window {} needs {} bars but minimum history is {}",
                spec.name,
                spec.required_bars(),
                self.min_history
            ));
        }
        if !self.columns.iter().any(|c| c.name == self.sort_by) {
            return Err(format!("sort column {} is not reported", self.sort_by));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::Comparison;

    fn rule<'a>(strategy: &'a Strategy, name: &str) -> &'a Rule {
        strategy.rules.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn builtin_strategies_are_consistent() {
        for kind in StrategyKind::ALL {
            let strategy = Strategy::for_kind(kind);
            assert_eq!(strategy.kind, kind);
            assert!(strategy.validate().is_ok(), "{} invalid", kind);
        }
    }

    #[test]
    fn history_and_lookback() {
        assert_eq!(Strategy::liquidity_trend().min_history, 25);
        assert_eq!(Strategy::two_stage().min_history, 25);
        assert_eq!(Strategy::price_gap().min_history, 60);
        assert_eq!(Strategy::liquidity_trend().lookback_months, 3);
        assert_eq!(Strategy::price_gap().lookback_months, 4);
    }

    #[test]
    fn two_stage_volume_average_excludes_today() {
        let s = Strategy::two_stage();
        assert_eq!(s.indicator("avg_volume_5d").unwrap().alignment, Alignment::Prior);
        assert_eq!(s.indicator("ma5").unwrap().alignment, Alignment::Current);
    }

    #[test]
    fn liquidity_trend_rules_are_strict() {
        let s = Strategy::liquidity_trend();
        let names: Vec<_> = s.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["liquidity", "trend", "price_filter", "momentum"]);
        assert!(s.rules.iter().all(|r| r.cmp == Comparison::Above));
    }

    #[test]
    fn price_gap_mixes_inclusive_and_strict() {
        let s = Strategy::price_gap();
        for name in ["price_min_100", "value_min_5b", "volume_min_10m", "price_above_ma20"] {
            assert_eq!(rule(&s, name).cmp, Comparison::AtLeast, "{}", name);
        }
        for name in ["ma20_above_ma50", "volume_spike", "price_gap_8pct", "volume_above_ma20"] {
            assert_eq!(rule(&s, name).cmp, Comparison::Above, "{}", name);
        }
    }

    #[test]
    fn with_alignment_overrides_only_named_window() {
        let s = Strategy::two_stage().with_alignment("avg_volume_5d", Alignment::Current);
        assert_eq!(s.indicator("avg_volume_5d").unwrap().alignment, Alignment::Current);
        assert_eq!(s.indicators.len(), 3);
    }

    #[test]
    fn validate_rejects_undeclared_indicator() {
        let mut s = Strategy::liquidity_trend();
        s.rules.push(Rule::above("x", Fact::LastClose, Operand::indicator("ma200")));
        assert!(s.validate().unwrap_err().contains("ma200"));
    }

    #[test]
    fn validate_rejects_window_beyond_min_history() {
        let mut s = Strategy::liquidity_trend();
        s.min_history = 10;
        assert!(s.validate().unwrap_err().contains("minimum history"));
    }

    #[test]
    fn kind_parsing() {
        assert_eq!("L".parse::<StrategyKind>(), Ok(StrategyKind::LiquidityTrend));
        assert_eq!("s".parse::<StrategyKind>(), Ok(StrategyKind::TwoStage));
        assert_eq!("price-gap".parse::<StrategyKind>(), Ok(StrategyKind::PriceGap));
        assert_eq!(" two_stage ".parse::<StrategyKind>(), Ok(StrategyKind::TwoStage));
        assert!("X".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn kind_display_round_trips() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse::<StrategyKind>(), Ok(kind));
        }
    }
}
