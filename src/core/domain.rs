use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use itertools::Itertools;
use uuid::Uuid;

use crate::constants::{COVERAGE_DATA_FILE, SUCCESS_EXIT_CODE};
use crate::core::traits::adapter::CoverageData;

/// Test command to run once. It is consumed by the first execution.
#[derive(Clone, Debug)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl ProcessCommand {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            working_dir: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.working_dir = Some(dir.as_ref().into());
        self
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.iter().join(" "))
        }
    }
}

/// Terminal state of a finished test process.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub execution_time_ms: u64,
}

impl ProcessOutcome {
    /// Output the adapter classifies.
    pub fn output(&self) -> &str {
        &self.stdout
    }

    pub fn exited_successfully(&self) -> bool {
        self.exit_code == Some(SUCCESS_EXIT_CODE)
    }
}

/// Shared dependency context handed through the runner to the adapter.
#[derive(Clone, Debug)]
pub struct SuiteContext {
    pub run_id: Uuid,
    pub cache_dir: PathBuf,
    pub collect_coverage: bool,
}

impl SuiteContext {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Self {
        SuiteContext {
            run_id: Uuid::new_v4(),
            cache_dir: cache_dir.as_ref().into(),
            collect_coverage: true,
        }
    }

    pub fn coverage_data_file(&self) -> PathBuf {
        self.cache_dir.join(COVERAGE_DATA_FILE)
    }
}

/// Outcome of one baseline run.
///
/// Coverage is only ever attached to a run without failure. When it is
/// absent the headline percentage is `0.0`.
#[derive(Clone, Debug)]
pub struct SuiteResult {
    outcome: ProcessOutcome,
    has_failure: bool,
    coverage: Option<Arc<dyn CoverageData>>,
    line_coverage_percentage: f64,
}

impl SuiteResult {
    pub(crate) fn without_coverage(outcome: ProcessOutcome, has_failure: bool) -> Self {
        Self {
            outcome,
            has_failure,
            coverage: None,
            line_coverage_percentage: 0.0,
        }
    }

    pub(crate) fn with_coverage(
        outcome: ProcessOutcome,
        coverage: Arc<dyn CoverageData>,
        line_coverage_percentage: f64,
    ) -> Self {
        Self {
            outcome,
            has_failure: false,
            coverage: Some(coverage),
            line_coverage_percentage,
        }
    }

    pub fn outcome(&self) -> &ProcessOutcome {
        &self.outcome
    }

    pub fn has_failure(&self) -> bool {
        self.has_failure
    }

    pub fn coverage(&self) -> Option<&Arc<dyn CoverageData>> {
        self.coverage.as_ref()
    }

    pub fn line_coverage_percentage(&self) -> f64 {
        self.line_coverage_percentage
    }
}
