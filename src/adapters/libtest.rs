use std::sync::Arc;

use crate::core::{
    domain::SuiteContext,
    traits::adapter::{Adapter, AdapterError, CoverageData},
};

const SUMMARY_PREFIX: &str = "test result: ";

/// Output of the standard Rust test harness, as printed by `cargo test`.
///
/// ```text
/// test parser::tests::test_empty ... ok
/// test parser::tests::test_nested ... FAILED
///
/// test result: FAILED. 1 passed; 1 failed; 0 ignored; 0 measured; 0 filtered out
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct LibtestAdapter;

fn test_status(line: &str) -> Option<&str> {
    let line = line.trim_end();
    if !line.starts_with("test ") {
        return None;
    }
    line.rsplit_once(" ... ").map(|(_, status)| status)
}

#[async_trait::async_trait]
impl Adapter for LibtestAdapter {
    fn name(&self) -> &'static str {
        "libtest"
    }

    fn is_output_ok(&self, output: &str) -> bool {
        let mut summaries = output
            .lines()
            .filter_map(|line| line.trim_start().strip_prefix(SUMMARY_PREFIX))
            .peekable();

        summaries.peek().is_some() && summaries.all(|summary| summary.starts_with("ok."))
    }

    fn count_passed(&self, line: &str) -> u32 {
        match test_status(line) {
            Some("ok") => 1,
            _ => 0,
        }
    }

    fn is_failure_line(&self, line: &str) -> bool {
        test_status(line) == Some("FAILED")
    }

    async fn coverage_data(
        &self,
        context: &SuiteContext,
    ) -> Result<Arc<dyn CoverageData>, AdapterError> {
        super::load_lcov_coverage(context).await
    }
}
