use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::domain::SuiteContext;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("coverage file {path} does not exist")]
    MissingCoverage { path: PathBuf },
    #[error("failed to read coverage file {path}: {source}")]
    CoverageUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed coverage file {path} at line {line}: {reason}")]
    MalformedCoverage {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Test-framework specific interpretation of a test run.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Adapter: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Classifies the complete output of a finished run.
    fn is_output_ok(&self, output: &str) -> bool;

    /// Number of passing tests reported by one line of output.
    fn count_passed(&self, line: &str) -> u32;

    fn is_failure_line(&self, line: &str) -> bool;

    async fn coverage_data(
        &self,
        context: &SuiteContext,
    ) -> Result<Arc<dyn CoverageData>, AdapterError>;
}

/// Coverage captured by a passing run.
#[mockall::automock]
#[async_trait::async_trait]
pub trait CoverageData: std::fmt::Debug + Send + Sync {
    /// Headline line coverage, in percent, read from the given log.
    async fn line_coverage_from(&self, log_file: &Path) -> Result<f64, AdapterError>;

    /// Whether any test executed `line` (1-based) of `file`.
    fn is_line_covered(&self, file: &Path, line: u32) -> bool;
}
