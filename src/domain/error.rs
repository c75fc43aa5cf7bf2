//! Domain error types.
//!
//! Two families live here: [`ScreenerError`], returned by collaborators and
//! fatal when it escapes the universe loader or the report writer, and
//! [`SkipReason`], the per-ticker outcome the engine records instead of
//! propagating a failure to the batch.

use std::fmt;

/// Top-level error type for idxscreen.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("universe error: {0}")]
    Universe(#[from] crate::domain::universe::UniverseError),

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("malformed data for {ticker}: {reason}")]
    Malformed { ticker: String, reason: String },

    #[error("transport error for {ticker}: {reason}")]
    Transport { ticker: String, reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) | ScreenerError::Report { .. } => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::Universe(_) => 3,
            ScreenerError::NoData { .. }
            | ScreenerError::Malformed { .. }
            | ScreenerError::Transport { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

/// Why a ticker produced no result.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The provider returned nothing for the requested period.
    DataUnavailable,
    /// Required fields are missing or the series breaks its ordering invariant.
    MalformedData { reason: String },
    InsufficientHistory { bars: usize, minimum: usize },
    IndeterminateIndicator { name: String },
    /// The fetch itself failed (network, rate limit, unknown symbol).
    Transport { reason: String },
    /// Every input was usable but at least one rule evaluated to false.
    RulesFailed { failed: Vec<String> },
}

impl SkipReason {
    /// Stable short label used in logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::DataUnavailable => "data_unavailable",
            SkipReason::MalformedData { .. } => "malformed_data",
            SkipReason::InsufficientHistory { .. } => "insufficient_history",
            SkipReason::IndeterminateIndicator { .. } => "indeterminate_indicator",
            SkipReason::Transport { .. } => "transport_error",
            SkipReason::RulesFailed { .. } => "rules_failed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DataUnavailable => write!(f, "no data returned"),
            SkipReason::MalformedData { reason } => write!(f, "malformed data: {}", reason),
            SkipReason::InsufficientHistory { bars, minimum } => {
                write!(f, "insufficient data ({} rows, need {})", bars, minimum)
            }
            SkipReason::IndeterminateIndicator { name } => {
                write!(f, "indicator {} has no value", name)
            }
            SkipReason::Transport { reason } => write!(f, "fetch failed: {}", reason),
            SkipReason::RulesFailed { failed } => write!(f, "failed rules: {}", failed.join(", ")),
        }
    }
}

impl From<ScreenerError> for SkipReason {
    fn from(err: ScreenerError) -> Self {
        match err {
            ScreenerError::NoData { .. } => SkipReason::DataUnavailable,
            ScreenerError::Malformed { reason, .. } => SkipReason::MalformedData { reason },
            other => SkipReason::Transport {
                reason: other.to_string(),
            },
        }
    }
}
