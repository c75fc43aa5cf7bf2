//! Screen results and their report columns.

use crate::domain::format::{format_magnitude, round2};
use crate::domain::indicator::IndicatorSet;
use crate::domain::rule::Operand;
use crate::domain::rule_eval::{resolve_operand, MarketFacts};
use crate::domain::strategy::StrategyKind;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fmt;

/// How a report column is derived from facts and indicators.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    /// Rounded to two decimals.
    Decimal(Operand),
    /// Truncated to an integer count.
    Count(Operand),
    /// Abbreviated with [`format_magnitude`].
    Magnitude(Operand),
    /// `left - right`, rounded to two decimals.
    Difference(Operand, Operand),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub source: ColumnSource,
}

impl ColumnSpec {
    pub fn decimal(name: &str, operand: impl Into<Operand>) -> Self {
        Self::new(name, ColumnSource::Decimal(operand.into()))
    }

    pub fn count(name: &str, operand: impl Into<Operand>) -> Self {
        Self::new(name, ColumnSource::Count(operand.into()))
    }

    pub fn magnitude(name: &str, operand: impl Into<Operand>) -> Self {
        Self::new(name, ColumnSource::Magnitude(operand.into()))
    }

    pub fn difference(name: &str, left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self::new(name, ColumnSource::Difference(left.into(), right.into()))
    }

    fn new(name: &str, source: ColumnSource) -> Self {
        Self {
            name: name.to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Decimal(f64),
    Count(i64),
    Text(String),
}

impl ColumnValue {
    /// Numeric view used for sorting; text sorts as 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            ColumnValue::Decimal(v) => *v,
            ColumnValue::Count(v) => *v as f64,
            ColumnValue::Text(_) => 0.0,
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Decimal(v) => write!(f, "{:.2}", v),
            ColumnValue::Count(v) => write!(f, "{}", v),
            ColumnValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub value: ColumnValue,
}

/// A ticker that passed every rule of a strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenResult {
    pub ticker: String,
    pub strategy: StrategyKind,
    pub as_of: NaiveDate,
    pub columns: Vec<Column>,
}

impl ScreenResult {
    pub fn value(&self, name: &str) -> Option<&ColumnValue> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.value)
    }

    pub fn decimal(&self, name: &str) -> Option<f64> {
        match self.value(name)? {
            ColumnValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn count(&self, name: &str) -> Option<i64> {
        match self.value(name)? {
            ColumnValue::Count(v) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.value(name)? {
            ColumnValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

pub fn build_columns(
    specs: &[ColumnSpec],
    facts: &MarketFacts<'_>,
    indicators: &IndicatorSet,
) -> Vec<Column> {
    specs
        .iter()
        .map(|spec| {
            let value = match &spec.source {
                ColumnSource::Decimal(op) => {
                    ColumnValue::Decimal(round2(resolve_operand(op, facts, indicators)))
                }
                ColumnSource::Count(op) => {
                    ColumnValue::Count(resolve_operand(op, facts, indicators).trunc() as i64)
                }
                ColumnSource::Magnitude(op) => {
                    ColumnValue::Text(format_magnitude(resolve_operand(op, facts, indicators)))
                }
                ColumnSource::Difference(left, right) => {
                    let l = resolve_operand(left, facts, indicators);
                    let r = resolve_operand(right, facts, indicators);
                    ColumnValue::Decimal(round2(l - r))
                }
            };
            Column {
                name: spec.name.clone(),
                value,
            }
        })
        .collect()
}

/// Sorts descending by `column`; ties and missing values fall back to ticker order.
pub fn sort_results(results: &mut [ScreenResult], column: &str) {
    results.sort_by(|a, b| {
        let av = a.value(column).map(ColumnValue::as_f64);
        let bv = b.value(column).map(ColumnValue::as_f64);
        match (av, bv) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| a.ticker.cmp(&b.ticker))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use crate::domain::rule::Fact;

    fn bars() -> Vec<OhlcvBar> {
        [(1, 100.0, 1_000_000), (2, 103.456, 2_345_678)]
            .iter()
            .map(|&(day, close, volume)| OhlcvBar {
                code: "TEST".into(),
                date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume,
            })
            .collect()
    }

    fn result(ticker: &str, value: i64) -> ScreenResult {
        ScreenResult {
            ticker: ticker.into(),
            strategy: StrategyKind::PriceGap,
            as_of: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            columns: vec![Column {
                name: "value_today".into(),
                value: ColumnValue::Count(value),
            }],
        }
    }

    #[test]
    fn build_columns_rounds_and_formats() {
        let bars = bars();
        let facts = MarketFacts::from_bars(&bars).unwrap();
        let mut indicators = IndicatorSet::default();
        indicators.insert("avg", Some(1_672_839.4));

        let specs = vec![
            ColumnSpec::decimal("close", Fact::LastClose),
            ColumnSpec::count("avg_volume", Operand::indicator("avg")),
            ColumnSpec::magnitude("avg_volume_fmt", Operand::indicator("avg")),
            ColumnSpec::difference("momentum", Fact::LastClose, Fact::PrevClose),
        ];
        let cols = build_columns(&specs, &facts, &indicators);

        assert_eq!(cols.len(), 4);
        assert_eq!(cols[0].value, ColumnValue::Decimal(103.46));
        assert_eq!(cols[1].value, ColumnValue::Count(1_672_839));
        assert_eq!(cols[2].value, ColumnValue::Text("1.7M".into()));
        assert_eq!(cols[3].value, ColumnValue::Decimal(3.46));
    }

    #[test]
    fn typed_accessors() {
        let r = ScreenResult {
            ticker: "BBCA.JK".into(),
            strategy: StrategyKind::TwoStage,
            as_of: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            columns: vec![
                Column {
                    name: "close".into(),
                    value: ColumnValue::Decimal(9_875.0),
                },
                Column {
                    name: "value_today_fmt".into(),
                    value: ColumnValue::Text("12.50B".into()),
                },
            ],
        };
        assert_eq!(r.decimal("close"), Some(9_875.0));
        assert_eq!(r.count("close"), None);
        assert_eq!(r.text("value_today_fmt"), Some("12.50B"));
        assert!(r.value("missing").is_none());
    }

    #[test]
    fn column_value_display() {
        assert_eq!(ColumnValue::Decimal(4520.0).to_string(), "4520.00");
        assert_eq!(ColumnValue::Count(15_000_000).to_string(), "15000000");
        assert_eq!(ColumnValue::Text("15.0M".into()).to_string(), "15.0M");
    }

    #[test]
    fn sort_descending_with_ticker_tiebreak() {
        let mut results = vec![
            result("CCC.JK", 10),
            result("AAA.JK", 30),
            result("BBB.JK", 10),
            result("DDD.JK", 20),
        ];
        sort_results(&mut results, "value_today");
        let tickers: Vec<_> = results.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAA.JK", "DDD.JK", "BBB.JK", "CCC.JK"]);
    }
}
