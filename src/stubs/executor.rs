use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::core::{
    domain::{ProcessCommand, ProcessOutcome},
    traits::{
        adapter::Adapter,
        executor::{Execution, ExecutionError, ProcessExecutor, ProgressCallback},
    },
};

/// Replays a scripted execution: reports `progress` and then returns `result`.
/// An `Err` message is returned as a launch failure.
#[derive(Debug, Clone)]
pub struct ExecutorStub {
    result: Result<ProcessOutcome, String>,
    has_failure: bool,
    progress: Vec<u32>,
    calls: Arc<AtomicUsize>,
}

impl ExecutorStub {
    pub fn new(result: Result<ProcessOutcome, String>, has_failure: bool) -> Self {
        Self {
            result,
            has_failure,
            progress: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_progress(mut self, progress: Vec<u32>) -> Self {
        self.progress = progress;
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait::async_trait]
impl ProcessExecutor for ExecutorStub {
    #[tracing::instrument(skip(_adapter, on_progress))]
    async fn execute(
        &self,
        command: ProcessCommand,
        _adapter: &dyn Adapter,
        on_progress: ProgressCallback,
    ) -> Result<Execution, ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        for count in &self.progress {
            on_progress(*count);
        }
        tracing::debug!("Execution result: {:?}", self.result);

        match &self.result {
            Ok(outcome) => Ok(Execution {
                outcome: outcome.clone(),
                has_failure: self.has_failure,
            }),
            Err(msg) => Err(ExecutionError::FailedToLaunch {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, msg.clone()),
            }),
        }
    }
}
