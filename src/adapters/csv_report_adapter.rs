//! CSV report adapter implementing ReportPort.
//!
//! One file per run, named `<strategy>_<YYYY-MM-DD>_<HHMMSS>.csv`, with the
//! ticker followed by the strategy's report columns.

use crate::domain::error::ScreenerError;
use crate::domain::result::ScreenResult;
use crate::domain::strategy::Strategy;
use crate::ports::report_port::ReportPort;
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
pub struct CsvReportAdapter {
    timestamp: Option<NaiveDateTime>,
}

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the timestamp used in the file name instead of the local clock.
    pub fn with_timestamp(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp: Some(timestamp),
        }
    }

    pub fn file_name(&self, strategy: &Strategy) -> String {
        let ts = self.timestamp.unwrap_or_else(|| Local::now().naive_local());
        format!("{}_{}.csv", strategy.kind.slug(), ts.format("%Y-%m-%d_%H%M%S"))
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        results: &[ScreenResult],
        strategy: &Strategy,
        output_dir: &Path,
    ) -> Result<PathBuf, ScreenerError> {
        let report_err = |reason: String| ScreenerError::Report { reason };

        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(self.file_name(strategy));

        let mut wtr = csv::Writer::from_path(&path)
            .map_err(|e| report_err(format!("failed to create {}: {}", path.display(), e)))?;

        let mut header = vec!["ticker".to_string()];
        header.extend(strategy.columns.iter().map(|c| c.name.clone()));
        wtr.write_record(&header)
            .map_err(|e| report_err(e.to_string()))?;

        for result in results {
            let mut row = vec![result.ticker.clone()];
            row.extend(strategy.columns.iter().map(|spec| {
                result
                    .value(&spec.name)
                    .map(|v| v.to_string())
                    .unwrap_or_default()
            }));
            wtr.write_record(&row).map_err(|e| report_err(e.to_string()))?;
        }

        wtr.flush()?;
        Ok(path)
    }
}
