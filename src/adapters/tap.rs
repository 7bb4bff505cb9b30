use std::sync::Arc;

use crate::core::{
    domain::SuiteContext,
    traits::adapter::{Adapter, AdapterError, CoverageData},
};

/// Test Anything Protocol producers (prove, node-tap, bats, ...).
#[derive(Clone, Copy, Debug, Default)]
pub struct TapAdapter;

fn is_plan(line: &str) -> bool {
    line.strip_prefix("1..")
        .map(|rest| {
            let count = rest.split_whitespace().next().unwrap_or("");
            !count.is_empty() && count.chars().all(|c| c.is_ascii_digit())
        })
        .unwrap_or(false)
}

fn is_ok(line: &str) -> bool {
    line == "ok" || line.starts_with("ok ")
}

#[async_trait::async_trait]
impl Adapter for TapAdapter {
    fn name(&self) -> &'static str {
        "tap"
    }

    fn is_output_ok(&self, output: &str) -> bool {
        let lines = || output.lines().map(str::trim);
        lines().any(is_plan) && !lines().any(|line| self.is_failure_line(line))
    }

    fn count_passed(&self, line: &str) -> u32 {
        u32::from(is_ok(line.trim()))
    }

    fn is_failure_line(&self, line: &str) -> bool {
        let line = line.trim();
        line.starts_with("not ok") || line.starts_with("Bail out!")
    }

    async fn coverage_data(
        &self,
        context: &SuiteContext,
    ) -> Result<Arc<dyn CoverageData>, AdapterError> {
        super::load_lcov_coverage(context).await
    }
}
