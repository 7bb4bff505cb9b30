/// Execution of test commands as local child processes.
pub mod executor;
