//! Result export port.

use crate::domain::error::ScreenerError;
use crate::domain::result::ScreenResult;
use crate::domain::strategy::Strategy;
use std::path::{Path, PathBuf};

/// Port for writing the results of one screening run.
pub trait ReportPort {
    /// Writes `results` (already sorted) and returns the file written.
    fn write(
        &self,
        results: &[ScreenResult],
        strategy: &Strategy,
        output_dir: &Path,
    ) -> Result<PathBuf, ScreenerError>;
}
