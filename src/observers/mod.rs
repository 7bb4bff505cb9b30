use uuid::Uuid;

use crate::core::{domain::SuiteResult, traits::observer::Observer};

/// Reports the baseline run through `tracing`.
#[derive(Debug)]
pub struct LoggingObserver {
    run_id: Uuid,
}

impl LoggingObserver {
    pub fn new(run_id: Uuid) -> Self {
        Self { run_id }
    }
}

impl Observer for LoggingObserver {
    fn on_start_suite(&self) {
        tracing::info!(run_id = %self.run_id, "Running baseline test suite");
    }

    fn on_progress(&self, count: u32) {
        tracing::debug!(run_id = %self.run_id, passed = count, "Tests passed so far");
    }

    fn on_stop_suite(&self, result: &SuiteResult) {
        let outcome = result.outcome();
        if result.has_failure() {
            tracing::warn!(
                run_id = %self.run_id,
                exit_code = ?outcome.exit_code,
                started_at = %outcome.started_at,
                execution_time_ms = outcome.execution_time_ms,
                "Baseline test suite failed"
            );
            if !outcome.stderr.is_empty() {
                tracing::debug!(run_id = %self.run_id, "stderr:\n{}", outcome.stderr);
            }
        } else {
            tracing::info!(
                run_id = %self.run_id,
                line_coverage = result.line_coverage_percentage(),
                coverage_captured = result.coverage().is_some(),
                execution_time_ms = outcome.execution_time_ms,
                "Baseline test suite passed"
            );
        }
    }
}
