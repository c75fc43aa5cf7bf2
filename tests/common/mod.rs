#![allow(dead_code)]

use chrono::NaiveDate;
use idxscreen::domain::error::{ScreenerError, SkipReason};
use idxscreen::domain::indicator::IndicatorSet;
pub use idxscreen::domain::ohlcv::OhlcvBar;
use idxscreen::domain::result::ScreenResult;
use idxscreen::domain::rule_eval::{MarketFacts, RuleOutcome};
use idxscreen::domain::strategy::Strategy;
use idxscreen::ports::data_port::{DataPort, Lookback};
use idxscreen::ports::observer_port::ScreenObserver;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Mutex;

pub enum MockFailure {
    NoData,
    Malformed(String),
    Transport(String),
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub failures: HashMap<String, MockFailure>,
    pub requests: Mutex<Vec<(String, Lookback)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            failures: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_failure(mut self, ticker: &str, failure: MockFailure) -> Self {
        self.failures.insert(ticker.to_string(), failure);
        self
    }

    pub fn requested(&self) -> Vec<(String, Lookback)> {
        self.requests.lock().unwrap().clone()
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, ticker: &str, lookback: Lookback) -> Result<Vec<OhlcvBar>, ScreenerError> {
        self.requests
            .lock()
            .unwrap()
            .push((ticker.to_string(), lookback));

        let ticker_owned = ticker.to_string();
        match self.failures.get(ticker) {
            Some(MockFailure::NoData) => Err(ScreenerError::NoData {
                ticker: ticker_owned,
            }),
            Some(MockFailure::Malformed(reason)) => Err(ScreenerError::Malformed {
                ticker: ticker_owned,
                reason: reason.clone(),
            }),
            Some(MockFailure::Transport(reason)) => Err(ScreenerError::Transport {
                ticker: ticker_owned,
                reason: reason.clone(),
            }),
            None => Ok(self.data.get(ticker).cloned().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Rules {
        ticker: String,
        rules: Vec<(String, bool)>,
        indicators: Vec<(String, Option<f64>)>,
    },
    Skip {
        ticker: String,
        kind: &'static str,
    },
    Pass {
        ticker: String,
    },
}

/// Observer that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn rules_for(&self, ticker: &str) -> Option<Vec<(String, bool)>> {
        self.events().into_iter().find_map(|e| match e {
            Event::Rules { ticker: t, rules, .. } if t == ticker => Some(rules),
            _ => None,
        })
    }

    pub fn indicators_for(&self, ticker: &str) -> Option<Vec<(String, Option<f64>)>> {
        self.events().into_iter().find_map(|e| match e {
            Event::Rules {
                ticker: t,
                indicators,
                ..
            } if t == ticker => Some(indicators),
            _ => None,
        })
    }

    pub fn passes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Pass { ticker } => Some(ticker),
                _ => None,
            })
            .collect()
    }

    pub fn skips(&self) -> Vec<(String, &'static str)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Skip { ticker, kind } => Some((ticker, kind)),
                _ => None,
            })
            .collect()
    }
}

impl ScreenObserver for RecordingObserver {
    fn on_rules(
        &self,
        ticker: &str,
        _strategy: &Strategy,
        _facts: &MarketFacts<'_>,
        indicators: &IndicatorSet,
        outcome: &RuleOutcome,
    ) {
        self.events.lock().unwrap().push(Event::Rules {
            ticker: ticker.to_string(),
            rules: outcome.iter().map(|(n, ok)| (n.to_string(), ok)).collect(),
            indicators: indicators
                .iter()
                .map(|(n, v)| (n.to_string(), v))
                .collect(),
        });
    }

    fn on_skip(&self, ticker: &str, reason: &SkipReason) {
        self.events.lock().unwrap().push(Event::Skip {
            ticker: ticker.to_string(),
            kind: reason.kind(),
        });
    }

    fn on_pass(&self, result: &ScreenResult) {
        self.events.lock().unwrap().push(Event::Pass {
            ticker: result.ticker.clone(),
        });
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One bar per calendar day from 2024-01-01. Open is one below the close,
/// high two above, low two below.
pub fn series(ticker: &str, closes: &[f64], volumes: &[i64]) -> Vec<OhlcvBar> {
    assert_eq!(closes.len(), volumes.len());
    let start = date(2024, 1, 1);
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| OhlcvBar {
            code: ticker.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: close - 1.0,
            high: close + 2.0,
            low: (close - 2.0).max(0.0),
            close,
            volume,
        })
        .collect()
}

pub fn constant_series(ticker: &str, count: usize, close: f64, volume: i64) -> Vec<OhlcvBar> {
    series(ticker, &vec![close; count], &vec![volume; count])
}

/// 30 bars rising by 1 from 100 (last close 129) at a constant volume.
/// Passes the liquidity/trend strategy whenever `volume` exceeds 100M.
pub fn liquidity_series(ticker: &str, volume: i64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    series(ticker, &closes, &vec![volume; 30])
}

/// 30 bars for the two-stage strategy: closes rise by 1 from 150 to 178,
/// then jump to 182 (+2.25%) on the last bar. Volume is 20M except
/// `volume_6_ago` on the sixth-from-last bar and a 90M spike on the last.
///
/// With `volume_6_ago` = 20M every rule passes. With 400M the prior 5-day
/// average is 96M and `volume_momentum` fails, while a window that includes
/// the last bar averages 34M.
pub fn two_stage_series(ticker: &str, volume_6_ago: i64) -> Vec<OhlcvBar> {
    let mut closes: Vec<f64> = (0..29).map(|i| 150.0 + i as f64).collect();
    closes.push(182.0);
    let mut volumes = vec![20_000_000; 30];
    volumes[24] = volume_6_ago;
    volumes[29] = 90_000_000;
    series(ticker, &closes, &volumes)
}

/// 60 bars for the price-gap strategy: closes rise by 0.5 from 71 to a
/// previous close of 100, then gap to 110 on the last bar. Volume is
/// `base_volume` except the last two bars.
pub fn price_gap_series(
    ticker: &str,
    base_volume: i64,
    prev_volume: i64,
    volume_today: i64,
) -> Vec<OhlcvBar> {
    let mut closes: Vec<f64> = (0..59).map(|i| 71.0 + 0.5 * i as f64).collect();
    closes.push(110.0);
    let mut volumes = vec![base_volume; 60];
    volumes[58] = prev_volume;
    volumes[59] = volume_today;
    series(ticker, &closes, &volumes)
}

pub fn write_bars_csv(dir: &Path, ticker: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("Date,Open,High,Low,Close,Volume\n");
    for b in bars {
        writeln!(
            content,
            "{},{},{},{},{},{}",
            b.date, b.open, b.high, b.low, b.close, b.volume
        )
        .unwrap();
    }
    std::fs::write(dir.join(format!("{}.csv", ticker)), content).unwrap();
}
