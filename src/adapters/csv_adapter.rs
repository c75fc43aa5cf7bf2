//! CSV file data adapter.
//!
//! Reads `<base_path>/<TICKER>.csv` with a header row naming the columns
//! `date,open,high,low,close,volume` (any order, case-insensitive). The
//! lookback keeps the trailing N calendar months ending at the last bar.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::{DataPort, Lookback};
use chrono::{Months, NaiveDate};
use std::path::PathBuf;

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, ticker: &str, lookback: Lookback) -> Result<Vec<OhlcvBar>, ScreenerError> {
        let malformed = |reason: String| ScreenerError::Malformed {
            ticker: ticker.to_string(),
            reason,
        };

        let path = self.csv_path(ticker);
        if !path.exists() {
            return Err(ScreenerError::NoData {
                ticker: ticker.to_string(),
            });
        }

        let mut rdr = csv::Reader::from_path(&path).map_err(|e| ScreenerError::Transport {
            ticker: ticker.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let headers = rdr
            .headers()
            .map_err(|e| malformed(format!("CSV header error: {}", e)))?
            .clone();
        let mut index = [0usize; 6];
        for (slot, name) in index.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| malformed(format!("missing {} column", name)))?;
        }
        let [date_col, open_col, high_col, low_col, close_col, volume_col] = index;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| malformed(format!("CSV parse error: {}", e)))?;
            let field = |col: usize| record.get(col).map(str::trim).unwrap_or("");

            // Provider exports leave a blank field on non-trading rows.
            if index.iter().any(|&col| field(col).is_empty()) {
                continue;
            }

            let date = NaiveDate::parse_from_str(field(date_col), "%Y-%m-%d")
                .map_err(|e| malformed(format!("invalid date format: {}", e)))?;
            let number = |col: usize, name: &str| -> Result<f64, ScreenerError> {
                field(col)
                    .parse::<f64>()
                    .map_err(|e| malformed(format!("invalid {} value: {}", name, e)))
            };

            bars.push(OhlcvBar {
                code: ticker.to_string(),
                date,
                open: number(open_col, "open")?,
                high: number(high_col, "high")?,
                low: number(low_col, "low")?,
                close: number(close_col, "close")?,
                volume: number(volume_col, "volume")?.trunc() as i64,
            });
        }

        if bars.is_empty() {
            return Err(ScreenerError::NoData {
                ticker: ticker.to_string(),
            });
        }

        bars.sort_by_key(|b| b.date);
        if let Some(last) = bars.last().map(|b| b.date) {
            if let Some(start) = last.checked_sub_months(Months::new(lookback.months)) {
                bars.retain(|b| b.date > start);
            }
        }
        Ok(bars)
    }
}
