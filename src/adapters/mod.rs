use std::str::FromStr;
use std::sync::Arc;

use crate::{
    core::{
        domain::SuiteContext,
        traits::adapter::{Adapter, AdapterError, CoverageData},
    },
    coverage::{NoCoverage, lcov::LcovCoverage},
};

pub mod libtest;
pub mod tap;

/// Test frameworks the runner can interpret.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdapterKind {
    Libtest,
    Tap,
}

impl AdapterKind {
    pub fn build(self) -> Arc<dyn Adapter> {
        match self {
            AdapterKind::Libtest => Arc::new(libtest::LibtestAdapter),
            AdapterKind::Tap => Arc::new(tap::TapAdapter),
        }
    }
}

impl FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "libtest" | "cargo" => Ok(AdapterKind::Libtest),
            "tap" => Ok(AdapterKind::Tap),
            other => Err(format!("unknown test framework adapter `{}`", other)),
        }
    }
}

/// Loads the LCOV data the test command wrote into the cache directory.
/// Collection switched off in the context yields an empty handle.
async fn load_lcov_coverage(context: &SuiteContext) -> Result<Arc<dyn CoverageData>, AdapterError> {
    if !context.collect_coverage {
        tracing::debug!("Coverage collection disabled");
        return Ok(Arc::new(NoCoverage));
    }

    let coverage = LcovCoverage::load(&context.coverage_data_file()).await?;
    Ok(Arc::new(coverage))
}
