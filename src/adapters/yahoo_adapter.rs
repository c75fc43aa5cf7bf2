//! Yahoo Finance chart endpoint adapter.
//!
//! Fetches `<base_url>/<TICKER>?range=<N>mo&interval=1d` with a blocking
//! client. Transient failures (network errors, 429, 5xx) are retried with
//! exponential backoff (starting at `backoff`) up to `retries` extra
//! attempts; everything else is returned immediately.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, Lookback};
use chrono::DateTime;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; idxscreen/0.1)";

#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retries: u32,
    /// Wait before the first retry; doubles on each further retry.
    pub backoff: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

impl YahooConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = Self::default();
        Self {
            base_url: config
                .get_string("yahoo", "base_url")
                .unwrap_or(defaults.base_url),
            timeout: Duration::from_secs(config.get_int("yahoo", "timeout_secs", 10).max(1) as u64),
            retries: config.get_int("yahoo", "retries", 2).clamp(0, 10) as u32,
            backoff: Duration::from_millis(config.get_int("yahoo", "backoff_ms", 500).max(0) as u64),
        }
    }
}

pub struct YahooAdapter {
    client: Client,
    config: YahooConfig,
}

impl YahooAdapter {
    pub fn new(config: YahooConfig) -> Result<Self, ScreenerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScreenerError::ConfigInvalid {
                section: "yahoo".into(),
                key: "client".into(),
                reason: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    fn url(&self, ticker: &str, lookback: Lookback) -> String {
        format!(
            "{}/{}?range={}&interval=1d",
            self.config.base_url.trim_end_matches('/'),
            ticker,
            lookback.range_token()
        )
    }

    fn get_once(&self, ticker: &str, url: &str) -> Result<String, Attempt> {
        let transport = |reason: String| ScreenerError::Transport {
            ticker: ticker.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| Attempt::Retry(transport(e.to_string())))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(Attempt::Retry(transport(format!("HTTP {}", status))));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(Attempt::Fail(transport("unknown symbol".into())));
        }
        if !status.is_success() {
            return Err(Attempt::Fail(transport(format!("HTTP {}", status))));
        }

        resp.text()
            .map_err(|e| Attempt::Retry(transport(e.to_string())))
    }
}

enum Attempt {
    Retry(ScreenerError),
    Fail(ScreenerError),
}

impl DataPort for YahooAdapter {
    fn fetch_bars(&self, ticker: &str, lookback: Lookback) -> Result<Vec<OhlcvBar>, ScreenerError> {
        let url = self.url(ticker, lookback);
        let mut attempt = 0;
        loop {
            debug!(ticker, attempt, "fetching {}", url);
            match self.get_once(ticker, &url) {
                Ok(body) => return parse_chart(ticker, &body),
                Err(Attempt::Fail(err)) => return Err(err),
                Err(Attempt::Retry(err)) if attempt >= self.config.retries => return Err(err),
                Err(Attempt::Retry(err)) => {
                    let wait = self.config.backoff * 2u32.pow(attempt);
                    warn!(ticker, attempt, "retrying in {:?}: {}", wait, err);
                    std::thread::sleep(wait);
                    attempt += 1;
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

/// Decodes a chart response body into bars, oldest first.
///
/// Rows with any null field are dropped. When the provider repeats the
/// latest session (an intraday snapshot of today), the later row wins.
pub fn parse_chart(ticker: &str, body: &str) -> Result<Vec<OhlcvBar>, ScreenerError> {
    let malformed = |reason: String| ScreenerError::Malformed {
        ticker: ticker.to_string(),
        reason,
    };
    let no_data = || ScreenerError::NoData {
        ticker: ticker.to_string(),
    };

    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| malformed(format!("invalid chart JSON: {}", e)))?;

    if let Some(err) = envelope.chart.error {
        return Err(ScreenerError::Transport {
            ticker: ticker.to_string(),
            reason: format!(
                "{}: {}",
                err.code,
                err.description.unwrap_or_default()
            ),
        });
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(no_data)?;
    let timestamps = match result.timestamp {
        Some(ts) if !ts.is_empty() => ts,
        _ => return Err(no_data()),
    };
    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| malformed("missing quote block".into()))?;

    let column = |values: Option<Vec<Option<f64>>>, name: &str| {
        values.ok_or_else(|| malformed(format!("missing {} field", name)))
    };
    let open = column(quote.open, "open")?;
    let high = column(quote.high, "high")?;
    let low = column(quote.low, "low")?;
    let close = column(quote.close, "close")?;
    let volume = column(quote.volume, "volume")?;

    let mut bars: Vec<OhlcvBar> = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let at = |series: &[Option<f64>]| series.get(i).copied().flatten();
        let (Some(o), Some(h), Some(l), Some(c), Some(v)) =
            (at(&open[..]), at(&high[..]), at(&low[..]), at(&close[..]), at(&volume[..]))
        else {
            continue;
        };
        let date = DateTime::from_timestamp(ts + offset, 0)
            .ok_or_else(|| malformed(format!("invalid timestamp {}", ts)))?
            .date_naive();

        let bar = OhlcvBar {
            code: ticker.to_string(),
            date,
            open: o,
            high: h,
            low: l,
            close: c,
            volume: v.trunc() as i64,
        };
        match bars.last_mut() {
            Some(prev) if prev.date == date => *prev = bar,
            _ => bars.push(bar),
        }
    }

    if bars.is_empty() {
        return Err(no_data());
    }
    bars.sort_by_key(|b| b.date);
    Ok(bars)
}
