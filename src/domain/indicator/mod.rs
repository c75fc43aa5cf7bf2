//! Rolling indicator calculation.
//!
//! This module provides the types a strategy uses to ask for derived values:
//! - `PriceField`: which bar field a window reads
//! - `Alignment`: whether the window ends at the latest bar or the one before it
//! - `WindowSpec`: a named rolling-mean request
//! - `IndicatorSeries`: a per-bar series with a validity flag per point
//! - `IndicatorSet`: the named scalar values a rule set reads
//!
//! A windowed value is defined only when the window has a full `period` of
//! observations ending at the aligned bar. Undefined values are kept as
//! `None` so the caller can decide how to skip.

pub mod sma;

use crate::domain::ohlcv::OhlcvBar;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Close,
    Volume,
}

impl PriceField {
    pub fn extract(self, bar: &OhlcvBar) -> f64 {
        match self {
            PriceField::Close => bar.close,
            PriceField::Volume => bar.volume as f64,
        }
    }
}

/// Where a window ends relative to the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Mean of the last `period` bars, today included.
    Current,
    /// Mean of the `period` bars ending at the second-to-last bar. Today is
    /// excluded so a rule can compare today against a trailing average
    /// without look-ahead.
    Prior,
}

impl Alignment {
    /// Number of bars between the aligned position and the latest bar.
    pub fn offset(self) -> usize {
        match self {
            Alignment::Current => 0,
            Alignment::Prior => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub name: String,
    pub field: PriceField,
    pub period: usize,
    pub alignment: Alignment,
}

impl WindowSpec {
    pub fn new(name: &str, field: PriceField, period: usize, alignment: Alignment) -> Self {
        Self {
            name: name.to_string(),
            field,
            period,
            alignment,
        }
    }

    /// Bars needed for this window to be defined.
    pub fn required_bars(&self) -> usize {
        self.period + self.alignment.offset()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IndicatorPoint {
    pub valid: bool,
    pub value: f64,
}

/// One point per input bar, index-aligned with the bars.
#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// The value `offset` bars before the end, if that point is valid.
    pub fn value_back(&self, offset: usize) -> Option<f64> {
        let idx = self.values.len().checked_sub(1 + offset)?;
        let point = &self.values[idx];
        point.valid.then_some(point.value)
    }
}

/// Named indicator values in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    entries: Vec<(String, Option<f64>)>,
}

impl IndicatorSet {
    pub fn insert(&mut self, name: &str, value: Option<f64>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// `None` when the name is unknown or the value is undefined.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| *v)
    }

    /// Name of the first indicator without a value.
    pub fn first_undefined(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, v)| v.is_none())
            .map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Computes every requested window over `bars`.
pub fn compute(bars: &[OhlcvBar], specs: &[WindowSpec]) -> IndicatorSet {
    let mut set = IndicatorSet::default();
    for spec in specs {
        let series = sma::calculate_sma(bars, spec.field, spec.period);
        set.insert(&spec.name, series.value_back(spec.alignment.offset()));
    }
    set
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceField::Close => write!(f, "close"),
            PriceField::Volume => write!(f, "volume"),
        }
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alignment {
            Alignment::Current => write!(f, "{} = SMA({}, {})", self.name, self.field, self.period),
            Alignment::Prior => write!(
                f,
                "{} = SMA({}, {}) as of previous bar",
                self.name, self.field, self.period
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(closes: &[f64], volumes: &[i64]) -> Vec<OhlcvBar> {
        closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| OhlcvBar {
                code: "TEST".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume,
            })
            .collect()
    }

    #[test]
    fn current_alignment_includes_latest_bar() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0], &[10, 20, 30, 100]);
        let specs = [WindowSpec::new("vol3", PriceField::Volume, 3, Alignment::Current)];
        let set = compute(&bars, &specs);
        // (20 + 30 + 100) / 3
        assert!((set.get("vol3").unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn prior_alignment_excludes_latest_bar() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0], &[10, 20, 30, 100]);
        let specs = [WindowSpec::new("vol3", PriceField::Volume, 3, Alignment::Prior)];
        let set = compute(&bars, &specs);
        // (10 + 20 + 30) / 3
        assert!((set.get("vol3").unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn window_longer_than_history_is_undefined() {
        let bars = make_bars(&[1.0, 2.0, 3.0], &[1, 1, 1]);
        let specs = [
            WindowSpec::new("ma2", PriceField::Close, 2, Alignment::Current),
            WindowSpec::new("ma5", PriceField::Close, 5, Alignment::Current),
        ];
        let set = compute(&bars, &specs);
        assert!((set.get("ma2").unwrap() - 2.5).abs() < 1e-9);
        assert_eq!(set.get("ma5"), None);
        assert_eq!(set.first_undefined(), Some("ma5"));
    }

    #[test]
    fn prior_window_needs_one_extra_bar() {
        let bars = make_bars(&[1.0, 2.0, 3.0], &[1, 1, 1]);
        let specs = [WindowSpec::new("p3", PriceField::Close, 3, Alignment::Prior)];
        let set = compute(&bars, &specs);
        assert_eq!(set.get("p3"), None);
        assert_eq!(specs[0].required_bars(), 4);
    }

    #[test]
    fn empty_bars_leave_everything_undefined() {
        let specs = [WindowSpec::new("ma5", PriceField::Close, 5, Alignment::Current)];
        let set = compute(&[], &specs);
        assert_eq!(set.len(), 1);
        assert_eq!(set.first_undefined(), Some("ma5"));
    }

    #[test]
    fn set_preserves_declaration_order() {
        let mut set = IndicatorSet::default();
        set.insert("ma20", Some(1.0));
        set.insert("ma5", Some(2.0));
        set.insert("ma20", Some(3.0));
        let names: Vec<_> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["ma20", "ma5"]);
        assert_eq!(set.get("ma20"), Some(3.0));
    }

    #[test]
    fn window_spec_display() {
        let spec = WindowSpec::new("avg_volume_5d", PriceField::Volume, 5, Alignment::Prior);
        assert_eq!(
            spec.to_string(),
            "avg_volume_5d = SMA(volume, 5) as of previous bar"
        );
        let spec = WindowSpec::new("ma20", PriceField::Close, 20, Alignment::Current);
        assert_eq!(spec.to_string(), "ma20 = SMA(close, 20)");
    }
}
