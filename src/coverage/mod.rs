use std::path::Path;

use crate::core::traits::adapter::{AdapterError, CoverageData};

pub mod lcov;

/// Coverage of a run that was told not to collect any.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCoverage;

#[async_trait::async_trait]
impl CoverageData for NoCoverage {
    async fn line_coverage_from(&self, _log_file: &Path) -> Result<f64, AdapterError> {
        Ok(0.0)
    }

    fn is_line_covered(&self, _file: &Path, _line: u32) -> bool {
        false
    }
}
