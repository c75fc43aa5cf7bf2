//! Ticker universe loading.
//!
//! A universe is a named sector whose tickers come from a CSV file
//! `<sector_dir>/<sector>.csv`. The ticker column is found by header name
//! (any header containing `Kode`, `Saham` or `Ticker`); a file without such
//! a column is an error. Codes can also be given inline as a comma list.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const TICKER_HEADER_HINTS: [&str; 3] = ["Kode", "Saham", "Ticker"];

#[derive(Debug, Clone)]
pub struct Universe {
    pub sector: String,
    pub tickers: Vec<String>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.tickers.len()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),

    #[error("ticker column not found in CSV")]
    TickerColumnNotFound,

    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("sector {0} has no tickers")]
    Empty(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if seen.contains(&code) {
            return Err(UniverseError::DuplicateCode(code));
        }
        seen.insert(code.clone());
        codes.push(code);
    }

    Ok(codes)
}

/// Appends the exchange suffix unless the code already carries one.
pub fn with_suffix(code: &str, suffix: &str) -> String {
    if suffix.is_empty() || code.contains('.') {
        code.to_string()
    } else {
        format!("{}{}", code, suffix)
    }
}

pub fn sector_path(sector_dir: &Path, sector: &str) -> PathBuf {
    sector_dir.join(format!("{}.csv", sector))
}

/// Sector names available under `sector_dir`, sorted.
pub fn list_sectors(sector_dir: &Path) -> Result<Vec<String>, UniverseError> {
    let entries = fs::read_dir(sector_dir).map_err(|e| UniverseError::Read {
        path: sector_dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut sectors = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            if let Some(stem) = path.file_stem() {
                sectors.push(stem.to_string_lossy().into_owned());
            }
        }
    }
    sectors.sort();
    Ok(sectors)
}

/// Reads the ticker column of a CSV file: values are trimmed, blanks dropped,
/// duplicates removed keeping first occurrence, and `suffix` appended.
pub fn load_tickers_csv(path: &Path, suffix: &str) -> Result<Vec<String>, UniverseError> {
    let read_err = |reason: String| UniverseError::Read {
        path: path.display().to_string(),
        reason,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| read_err(e.to_string()))?;

    let headers = rdr.headers().map_err(|e| read_err(e.to_string()))?.clone();
    let column = headers
        .iter()
        .position(|h| TICKER_HEADER_HINTS.iter().any(|hint| h.contains(hint)))
        .ok_or(UniverseError::TickerColumnNotFound)?;

    let mut seen = HashSet::new();
    let mut tickers = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| read_err(e.to_string()))?;
        let Some(raw) = record.get(column) else {
            continue;
        };
        let code = raw.trim();
        if code.is_empty() || !seen.insert(code.to_string()) {
            continue;
        }
        tickers.push(format!("{}{}", code, suffix));
    }

    Ok(tickers)
}

pub fn load_universe(
    sector_dir: &Path,
    sector: &str,
    suffix: &str,
) -> Result<Universe, UniverseError> {
    let tickers = load_tickers_csv(&sector_path(sector_dir, sector), suffix)?;
    if tickers.is_empty() {
        return Err(UniverseError::Empty(sector.to_string()));
    }
    Ok(Universe {
        sector: sector.to_string(),
        tickers,
    })
}
