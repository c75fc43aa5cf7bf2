//! Configuration validation.
//!
//! Validates all config fields before a screening run.

use crate::domain::error::ScreenerError;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;

pub const MAX_WORKERS: i64 = 16;
pub const MAX_RETRIES: i64 = 10;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_screener_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_strategy(config)?;
    validate_workers(config)?;
    validate_top(config)?;
    validate_data_source(config)?;
    validate_yahoo(config)?;
    validate_output(config)?;
    validate_log_level(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> ScreenerError {
    ScreenerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if let Some(value) = config.get_string("screener", "strategy") {
        value
            .parse::<StrategyKind>()
            .map_err(|reason| invalid("screener", "strategy", &reason))?;
    }
    Ok(())
}

fn validate_workers(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let value = config.get_int("screener", "workers", 1);
    if !(1..=MAX_WORKERS).contains(&value) {
        return Err(invalid(
            "screener",
            "workers",
            &format!("workers must be between 1 and {}", MAX_WORKERS),
        ));
    }
    Ok(())
}

fn validate_top(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if config.get_int("screener", "top", 5) < 0 {
        return Err(invalid("screener", "top", "top must be non-negative"));
    }
    Ok(())
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "yahoo".to_string());
    match source.trim().to_lowercase().as_str() {
        "csv" => {
            let dir = config.get_string("data", "dir").unwrap_or_default();
            if dir.trim().is_empty() {
                return Err(ScreenerError::ConfigMissing {
                    section: "data".to_string(),
                    key: "dir".to_string(),
                });
            }
            Ok(())
        }
        "yahoo" => Ok(()),
        _ => Err(invalid("data", "source", "source must be csv or yahoo")),
    }
}

fn validate_yahoo(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if config.get_int("yahoo", "timeout_secs", 10) <= 0 {
        return Err(invalid("yahoo", "timeout_secs", "timeout_secs must be positive"));
    }
    if config.get_int("yahoo", "backoff_ms", 500) < 0 {
        return Err(invalid("yahoo", "backoff_ms", "backoff_ms must be non-negative"));
    }
    let retries = config.get_int("yahoo", "retries", 2);
    if !(0..=MAX_RETRIES).contains(&retries) {
        return Err(invalid(
            "yahoo",
            "retries",
            &format!("retries must be between 0 and {}", MAX_RETRIES),
        ));
    }
    Ok(())
}

fn validate_output(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if let Some(dir) = config.get_string("output", "dir") {
        let path = std::path::Path::new(&dir);
        if path.exists() && !path.is_dir() {
            return Err(invalid("output", "dir", "dir exists and is not a directory"));
        }
    }
    if let Some(export) = config.get_string("output", "export") {
        if !matches!(
            export.to_lowercase().as_str(),
            "true" | "yes" | "1" | "false" | "no" | "0"
        ) {
            return Err(invalid("output", "export", "export must be true or false"));
        }
    }
    Ok(())
}

fn validate_log_level(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if let Some(level) = config.get_string("logging", "level") {
        if !LOG_LEVELS.contains(&level.trim().to_lowercase().as_str()) {
            return Err(invalid(
                "logging",
                "level",
                "level must be one of trace, debug, info, warn, error",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn assert_invalid(content: &str, expected_key: &str) {
        let err = validate_screener_config(&config(content)).unwrap_err();
        match err {
            ScreenerError::ConfigInvalid { key, .. } | ScreenerError::ConfigMissing { key, .. } => {
                assert_eq!(key, expected_key)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_config_uses_valid_defaults() {
        assert!(validate_screener_config(&config("[screener]\n")).is_ok());
    }

    #[test]
    fn full_config_is_valid() {
        let content = r#"
[screener]
strategy = G
sector = banks
sector_dir = data/sectors
ticker_suffix = .JK
workers = 4
top = 10

[data]
source = csv
dir = data/bars

[yahoo]
timeout_secs = 5
retries = 3

[output]
dir = out
export = no

[logging]
level = debug
"#;
        assert!(validate_screener_config(&config(content)).is_ok());
    }

    #[test]
    fn unknown_strategy() {
        assert_invalid("[screener]\nstrategy = Z\n", "strategy");
    }

    #[test]
    fn workers_out_of_range() {
        assert_invalid("[screener]\nworkers = 0\n", "workers");
        assert_invalid("[screener]\nworkers = 64\n", "workers");
    }

    #[test]
    fn negative_top() {
        assert_invalid("[screener]\ntop = -1\n", "top");
    }

    #[test]
    fn csv_source_requires_dir() {
        assert_invalid("[data]\nsource = csv\n", "dir");
    }

    #[test]
    fn unknown_source() {
        assert_invalid("[data]\nsource = bloomberg\n", "source");
    }

    #[test]
    fn yahoo_limits() {
        assert_invalid("[yahoo]\ntimeout_secs = 0\n", "timeout_secs");
        assert_invalid("[yahoo]\nretries = 11\n", "retries");
        assert_invalid("[yahoo]\nbackoff_ms = -5\n", "backoff_ms");
    }

    #[test]
    fn bad_log_level() {
        assert_invalid("[logging]\nlevel = chatty\n", "level");
    }

    #[test]
    fn output_dir_must_not_be_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_invalid(&format!("[output]\ndir = {}\n", file.path().display()), "dir");
    }

    #[test]
    fn output_export_must_be_boolean() {
        assert_invalid("[output]\nexport = sometimes\n", "export");
    }
}
