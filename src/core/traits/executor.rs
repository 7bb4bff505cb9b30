use crate::core::{
    domain::{ProcessCommand, ProcessOutcome},
    traits::adapter::Adapter,
};

/// Receives the running total of passed tests while a process streams output.
pub type ProgressCallback = Box<dyn Fn(u32) + Send + Sync>;

#[derive(Clone, Debug)]
pub struct Execution {
    pub outcome: ProcessOutcome,
    pub has_failure: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("failed to launch `{command}`: {source}")]
    FailedToLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to collect output of `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` did not finish within {timeout_ms} ms")]
    TimedOut { command: String, timeout_ms: u64 },
}

/// Runs a test process to completion.
///
/// Implementations call `on_progress` with non-decreasing counts and return
/// only once the process has terminated.
#[async_trait::async_trait]
pub trait ProcessExecutor: std::fmt::Debug + Send + Sync {
    async fn execute(
        &self,
        command: ProcessCommand,
        adapter: &dyn Adapter,
        on_progress: ProgressCallback,
    ) -> Result<Execution, ExecutionError>;
}
