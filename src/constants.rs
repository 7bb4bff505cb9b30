/// Exit status a test process reports when the whole suite passed.
pub const SUCCESS_EXIT_CODE: i32 = 0;

/// File name, inside the cache directory, the test command writes LCOV data to.
pub const COVERAGE_DATA_FILE: &str = "coverage.lcov";

pub const DEFAULT_CACHE_DIR_NAME: &str = "baseline-runner";
