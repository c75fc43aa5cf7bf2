//! Simple moving average over a bar field.
//!
//! SMA(n)[i] = sum(F[i-j] for j in 0..n) / n
//! Warmup: first (n-1) bars are invalid. A zero period yields no valid points.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, PriceField};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], field: PriceField, period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let valid = period > 0 && i + 1 >= period;
        let value = if valid {
            bars[i + 1 - period..=i]
                .iter()
                .map(|b| field.extract(b))
                .sum::<f64>()
                / period as f64
        } else {
            0.0
        };

        values.push(IndicatorPoint { valid, value });
    }

    IndicatorSeries { values }
}
