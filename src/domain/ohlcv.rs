//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// close * volume, the day's traded value.
    pub fn traded_value(&self) -> f64 {
        self.close * self.volume as f64
    }
}

/// Checks the series invariants: strictly increasing dates and finite,
/// non-negative prices and volume. Returns the first violation found.
pub fn check_series(bars: &[OhlcvBar]) -> Result<(), String> {
    for (i, bar) in bars.iter().enumerate() {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(format!("invalid price on {}", bar.date));
        }
        if bar.volume < 0 {
            return Err(format!("negative volume on {}", bar.date));
        }
        if i > 0 && bar.date <= bars[i - 1].date {
            return Err(format!(
                "dates out of order: {} follows {}",
                bar.date,
                bars[i - 1].date
            ));
        }
    }
    Ok(())
}
