//! Market data access port.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;

/// How much daily history to request, in calendar months ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookback {
    pub months: u32,
}

impl Lookback {
    pub fn months(months: u32) -> Self {
        Self { months }
    }

    /// Provider range token, e.g. `3mo`.
    pub fn range_token(&self) -> String {
        format!("{}mo", self.months)
    }
}

pub trait DataPort {
    /// Daily bars for `ticker`, oldest first.
    ///
    /// Errors map onto skip reasons: [`ScreenerError::NoData`] for an empty
    /// response, [`ScreenerError::Malformed`] for missing fields, anything
    /// else is treated as a transport failure.
    fn fetch_bars(&self, ticker: &str, lookback: Lookback) -> Result<Vec<OhlcvBar>, ScreenerError>;
}
