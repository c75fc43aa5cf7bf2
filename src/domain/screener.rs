//! Screening engine.
//!
//! Runs one [`Strategy`] over one ticker's bars:
//! history check, indicator computation, total rule evaluation, and result
//! construction. Every failure is converted into a [`SkipReason`] and stays
//! scoped to its ticker; nothing here aborts a batch.

use crate::domain::error::SkipReason;
use crate::domain::indicator;
use crate::domain::ohlcv::{check_series, OhlcvBar};
use crate::domain::result::{build_columns, sort_results, ScreenResult};
use crate::domain::rule_eval::{evaluate, MarketFacts};
use crate::domain::strategy::Strategy;
use crate::ports::data_port::{DataPort, Lookback};
use crate::ports::observer_port::ScreenObserver;
use rayon::prelude::*;
use std::collections::BTreeMap;

pub type ScreenOutcome = Result<ScreenResult, SkipReason>;

#[derive(Debug, Clone, PartialEq)]
pub struct Skip {
    pub ticker: String,
    pub reason: SkipReason,
}

/// Everything one batch produced. Results are sorted by the strategy's sort
/// column; skips keep universe order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub scanned: usize,
    pub results: Vec<ScreenResult>,
    pub skipped: Vec<Skip>,
}

impl BatchReport {
    pub fn skipped_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for skip in &self.skipped {
            *counts.entry(skip.reason.kind()).or_insert(0) += 1;
        }
        counts
    }

    pub fn skip_for(&self, ticker: &str) -> Option<&SkipReason> {
        self.skipped
            .iter()
            .find(|s| s.ticker == ticker)
            .map(|s| &s.reason)
    }
}

/// Screens an already-fetched series. Pure apart from the observer's
/// `on_rules` hook.
pub fn screen_bars(
    ticker: &str,
    bars: &[OhlcvBar],
    strategy: &Strategy,
    observer: &dyn ScreenObserver,
) -> ScreenOutcome {
    if bars.is_empty() {
        return Err(SkipReason::DataUnavailable);
    }
    check_series(bars).map_err(|reason| SkipReason::MalformedData { reason })?;

    let minimum = strategy.min_history.max(2);
    if bars.len() < minimum {
        return Err(SkipReason::InsufficientHistory {
            bars: bars.len(),
            minimum,
        });
    }
    let facts = MarketFacts::from_bars(bars).ok_or(SkipReason::InsufficientHistory {
        bars: bars.len(),
        minimum,
    })?;

    let indicators = indicator::compute(bars, &strategy.indicators);
    if let Some(name) = indicators.first_undefined() {
        return Err(SkipReason::IndeterminateIndicator {
            name: name.to_string(),
        });
    }

    let outcome = evaluate(&strategy.rules, &facts, &indicators);
    observer.on_rules(ticker, strategy, &facts, &indicators, &outcome);
    if !outcome.passed() {
        return Err(SkipReason::RulesFailed {
            failed: outcome.failed(),
        });
    }

    Ok(ScreenResult {
        ticker: ticker.to_string(),
        strategy: strategy.kind,
        as_of: facts.as_of(),
        columns: build_columns(&strategy.columns, &facts, &indicators),
    })
}

pub struct Screener<'a> {
    strategy: Strategy,
    data_port: &'a (dyn DataPort + Sync),
    observer: &'a (dyn ScreenObserver + Sync),
    workers: usize,
}

impl<'a> Screener<'a> {
    pub fn new(
        strategy: Strategy,
        data_port: &'a (dyn DataPort + Sync),
        observer: &'a (dyn ScreenObserver + Sync),
    ) -> Self {
        Self {
            strategy,
            data_port,
            observer,
            workers: 1,
        }
    }

    /// Number of tickers fetched concurrently. Values below 1 are treated as 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Fetches and screens one ticker.
    pub fn screen(&self, ticker: &str) -> ScreenOutcome {
        let lookback = Lookback::months(self.strategy.lookback_months);
        let outcome = self
            .data_port
            .fetch_bars(ticker, lookback)
            .map_err(SkipReason::from)
            .and_then(|bars| screen_bars(ticker, &bars, &self.strategy, self.observer));

        match &outcome {
            Ok(result) => self.observer.on_pass(result),
            Err(reason) => self.observer.on_skip(ticker, reason),
        }
        outcome
    }

    /// Screens every ticker and sorts the passing results.
    pub fn screen_universe(&self, tickers: &[String]) -> BatchReport {
        let outcomes = if self.workers <= 1 || tickers.len() <= 1 {
            tickers.iter().map(|t| self.screen(t)).collect()
        } else {
            self.screen_pooled(tickers)
        };

        let mut report = BatchReport {
            scanned: tickers.len(),
            ..BatchReport::default()
        };
        for (ticker, outcome) in tickers.iter().zip(outcomes) {
            match outcome {
                Ok(result) => report.results.push(result),
                Err(reason) => report.skipped.push(Skip {
                    ticker: ticker.clone(),
                    reason,
                }),
            }
        }
        sort_results(&mut report.results, &self.strategy.sort_by);
        report
    }

    /// Screens on a dedicated rayon pool of `workers` threads. Outcomes come
    /// back in universe order.
    fn screen_pooled(&self, tickers: &[String]) -> Vec<ScreenOutcome> {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("screen-{}", i))
            .build()
        {
            Ok(pool) => pool.install(|| tickers.par_iter().map(|t| self.screen(t)).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "worker pool unavailable, screening sequentially");
                tickers.iter().map(|t| self.screen(t)).collect()
            }
        }
    }
}
