use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    core::{
        domain::{ProcessCommand, SuiteContext, SuiteResult},
        traits::{
            adapter::{Adapter, AdapterError},
            executor::{Execution, ExecutionError, ProcessExecutor, ProgressCallback},
            observer::Observer,
        },
    },
    native::executor::NativeExecutor,
};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("the test process of this runner has already been executed")]
    ProcessConsumed,
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Runs the unmutated test suite once and captures its coverage.
///
/// The process command is single-use: the first call to [`Runner::run`]
/// takes it, later calls fail with [`RunnerError::ProcessConsumed`].
#[derive(Debug)]
pub struct Runner {
    adapter: Arc<dyn Adapter>,
    process: Option<ProcessCommand>,
    coverage_log_file: PathBuf,
    executor: Arc<dyn ProcessExecutor>,
    observers: Vec<Arc<dyn Observer>>,
}

impl Runner {
    pub fn new<P: AsRef<Path>>(
        adapter: Arc<dyn Adapter>,
        process: ProcessCommand,
        coverage_log_file: P,
    ) -> Self {
        Self {
            adapter,
            process: Some(process),
            coverage_log_file: coverage_log_file.as_ref().into(),
            executor: Arc::new(NativeExecutor::new()),
            observers: Vec::new(),
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn ProcessExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn Observer>) {
        self.observers.push(observer);
    }

    /// Runs the suite, notifying observers around it.
    ///
    /// Observers see `on_stop_suite` only when a result could be built. An
    /// execution or coverage error returns early without it.
    pub async fn run(&mut self, context: &SuiteContext) -> Result<SuiteResult, RunnerError> {
        let process = self.process.take().ok_or(RunnerError::ProcessConsumed)?;

        self.notify_start();

        let Execution {
            outcome,
            has_failure,
        } = self
            .executor
            .execute(process, self.adapter.as_ref(), self.progress_callback())
            .await?;

        let result = if !has_failure
            && self.adapter.is_output_ok(outcome.output())
            && outcome.exited_successfully()
        {
            let coverage = self.adapter.coverage_data(context).await?;
            let line_coverage = coverage.line_coverage_from(&self.coverage_log_file).await?;
            SuiteResult::with_coverage(outcome, coverage, line_coverage)
        } else {
            SuiteResult::without_coverage(outcome, has_failure)
        };

        self.notify_stop(&result);

        Ok(result)
    }

    fn progress_callback(&self) -> ProgressCallback {
        let observers = self.observers.clone();
        Box::new(move |count| {
            for observer in &observers {
                observer.on_progress(count);
            }
        })
    }

    fn notify_start(&self) {
        for observer in &self.observers {
            observer.on_start_suite();
        }
    }

    fn notify_stop(&self, result: &SuiteResult) {
        for observer in &self.observers {
            observer.on_stop_suite(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{
            domain::ProcessOutcome,
            traits::{
                adapter::{CoverageData, MockAdapter, MockCoverageData},
                observer::MockObserver,
            },
        },
        stubs::executor::ExecutorStub,
    };
    use mockall::{Sequence, predicate::eq};
    use std::path::Path;

    const COVERAGE_LOG: &str = "/tmp/baseline/coverage.lcov";

    fn outcome(exit_code: i32, stdout: &str) -> ProcessOutcome {
        ProcessOutcome {
            exit_code: Some(exit_code),
            stdout: stdout.to_string(),
            stderr: String::new(),
            started_at: chrono::Utc::now(),
            execution_time_ms: 100,
        }
    }

    fn context() -> SuiteContext {
        SuiteContext::new("/tmp/baseline")
    }

    fn command() -> ProcessCommand {
        ProcessCommand::new("cargo").arg("test")
    }

    fn covering_adapter(line_coverage: f64) -> MockAdapter {
        let mut coverage = MockCoverageData::new();
        coverage
            .expect_line_coverage_from()
            .withf(|log_file| log_file == Path::new(COVERAGE_LOG))
            .times(1)
            .returning(move |_| Ok(line_coverage));

        let mut adapter = MockAdapter::new();
        adapter.expect_is_output_ok().return_const(true);
        adapter
            .expect_coverage_data()
            .times(1)
            .return_once(move |_| Ok(Arc::new(coverage) as Arc<dyn CoverageData>));
        adapter
    }

    fn runner(adapter: MockAdapter, executor: ExecutorStub) -> Runner {
        Runner::new(Arc::new(adapter), command(), COVERAGE_LOG).with_executor(Arc::new(executor))
    }

    #[tokio::test]
    async fn test_passing_suite_captures_coverage() {
        let adapter = covering_adapter(87.5);
        let executor = ExecutorStub::new(Ok(outcome(0, "OK (10 tests)")), false);
        let mut runner = runner(adapter, executor);

        let result = runner.run(&context()).await.unwrap();

        assert!(!result.has_failure());
        assert!(result.coverage().is_some());
        assert_eq!(result.line_coverage_percentage(), 87.5);
        assert_eq!(result.outcome().output(), "OK (10 tests)");
    }

    #[tokio::test]
    async fn test_failing_suite_skips_coverage() {
        let mut adapter = MockAdapter::new();
        adapter.expect_is_output_ok().return_const(false);
        adapter.expect_coverage_data().never();
        let executor = ExecutorStub::new(Ok(outcome(1, "FAILURES!")), true);
        let mut runner = runner(adapter, executor);

        let result = runner.run(&context()).await.unwrap();

        assert!(result.has_failure());
        assert!(result.coverage().is_none());
        assert_eq!(result.line_coverage_percentage(), 0.0);
        assert_eq!(result.outcome().exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_reported_failure_wins_over_ok_output() {
        let mut adapter = MockAdapter::new();
        adapter.expect_is_output_ok().return_const(true);
        adapter.expect_coverage_data().never();
        let executor = ExecutorStub::new(Ok(outcome(0, "OK (10 tests)")), true);
        let mut runner = runner(adapter, executor);

        let result = runner.run(&context()).await.unwrap();

        assert!(result.has_failure());
        assert!(result.coverage().is_none());
        assert_eq!(result.line_coverage_percentage(), 0.0);
    }

    #[tokio::test]
    async fn test_rejected_output_skips_coverage_despite_zero_exit() {
        let mut adapter = MockAdapter::new();
        adapter
            .expect_is_output_ok()
            .with(eq("OK, but incomplete, skipped, or risky tests!"))
            .times(1)
            .return_const(false);
        adapter.expect_coverage_data().never();
        let executor = ExecutorStub::new(
            Ok(outcome(0, "OK, but incomplete, skipped, or risky tests!")),
            false,
        );
        let mut runner = runner(adapter, executor);

        let result = runner.run(&context()).await.unwrap();

        assert!(!result.has_failure());
        assert!(result.coverage().is_none());
        assert_eq!(result.line_coverage_percentage(), 0.0);
    }

    #[tokio::test]
    async fn test_non_zero_exit_skips_coverage() {
        let mut adapter = MockAdapter::new();
        adapter.expect_is_output_ok().return_const(true);
        adapter.expect_coverage_data().never();
        let executor = ExecutorStub::new(Ok(outcome(101, "OK (10 tests)")), false);
        let mut runner = runner(adapter, executor);

        let result = runner.run(&context()).await.unwrap();

        assert!(result.coverage().is_none());
        assert_eq!(result.line_coverage_percentage(), 0.0);
    }

    #[tokio::test]
    async fn test_observers_notified_in_registration_order() {
        let mut seq = Sequence::new();
        let mut observers: Vec<MockObserver> = (0..3).map(|_| MockObserver::new()).collect();

        for observer in observers.iter_mut() {
            observer
                .expect_on_start_suite()
                .times(1)
                .in_sequence(&mut seq)
                .return_const(());
        }
        for count in [5, 10, 15] {
            for observer in observers.iter_mut() {
                observer
                    .expect_on_progress()
                    .with(eq(count))
                    .times(1)
                    .in_sequence(&mut seq)
                    .return_const(());
            }
        }
        for observer in observers.iter_mut() {
            observer
                .expect_on_stop_suite()
                .withf(|result| !result.has_failure())
                .times(1)
                .in_sequence(&mut seq)
                .return_const(());
        }

        let executor =
            ExecutorStub::new(Ok(outcome(0, "OK (15 tests)")), false).with_progress(vec![5, 10, 15]);
        let mut runner = runner(covering_adapter(100.0), executor);
        for observer in observers {
            runner.add_observer(Arc::new(observer));
        }

        runner.run(&context()).await.unwrap();
    }

    #[tokio::test]
    async fn test_progress_relayed_verbatim() {
        let mut seq = Sequence::new();
        let mut observer = MockObserver::new();
        observer.expect_on_start_suite().times(1).return_const(());
        for count in [0, 3, 3, 7] {
            observer
                .expect_on_progress()
                .with(eq(count))
                .times(1)
                .in_sequence(&mut seq)
                .return_const(());
        }
        observer
            .expect_on_stop_suite()
            .withf(|result| result.has_failure())
            .times(1)
            .return_const(());

        let mut adapter = MockAdapter::new();
        adapter.expect_is_output_ok().return_const(false);
        let executor =
            ExecutorStub::new(Ok(outcome(1, "FAILURES!")), true).with_progress(vec![0, 3, 3, 7]);
        let mut runner = runner(adapter, executor);
        runner.add_observer(Arc::new(observer));

        runner.run(&context()).await.unwrap();
    }

    #[tokio::test]
    async fn test_same_observer_registered_twice_is_notified_twice() {
        let mut observer = MockObserver::new();
        observer.expect_on_start_suite().times(2).return_const(());
        observer.expect_on_stop_suite().times(2).return_const(());
        let observer = Arc::new(observer);

        let mut adapter = MockAdapter::new();
        adapter.expect_is_output_ok().return_const(false);
        let executor = ExecutorStub::new(Ok(outcome(1, "FAILURES!")), true);
        let mut runner = runner(adapter, executor);
        runner.add_observer(observer.clone());
        runner.add_observer(observer);

        runner.run(&context()).await.unwrap();
    }

    #[tokio::test]
    async fn test_launch_failure_propagates_without_stop_notification() {
        let mut observer = MockObserver::new();
        observer.expect_on_start_suite().times(1).return_const(());
        observer.expect_on_stop_suite().never();

        let mut adapter = MockAdapter::new();
        adapter.expect_coverage_data().never();
        let executor = ExecutorStub::new(Err("binary not found".to_string()), true);
        let mut runner = runner(adapter, executor);
        runner.add_observer(Arc::new(observer));

        let result = runner.run(&context()).await;

        assert!(matches!(
            result,
            Err(RunnerError::Execution(ExecutionError::FailedToLaunch { .. }))
        ));
    }

    #[tokio::test]
    async fn test_coverage_error_propagates_without_stop_notification() {
        let mut observer = MockObserver::new();
        observer.expect_on_start_suite().times(1).return_const(());
        observer.expect_on_stop_suite().never();

        let mut adapter = MockAdapter::new();
        adapter.expect_is_output_ok().return_const(true);
        adapter.expect_coverage_data().times(1).returning(|context| {
            Err(AdapterError::MissingCoverage {
                path: context.coverage_data_file(),
            })
        });
        let executor = ExecutorStub::new(Ok(outcome(0, "OK (10 tests)")), false);
        let mut runner = runner(adapter, executor);
        runner.add_observer(Arc::new(observer));

        let result = runner.run(&context()).await;

        assert!(matches!(
            result,
            Err(RunnerError::Adapter(AdapterError::MissingCoverage { .. }))
        ));
    }

    #[tokio::test]
    async fn test_second_run_fails_fast() {
        let mut observer = MockObserver::new();
        observer.expect_on_start_suite().times(1).return_const(());
        observer.expect_on_stop_suite().times(1).return_const(());

        let mut adapter = MockAdapter::new();
        adapter.expect_is_output_ok().return_const(false);
        let executor = ExecutorStub::new(Ok(outcome(1, "FAILURES!")), true);
        let calls = executor.calls();
        let mut runner = runner(adapter, executor);
        runner.add_observer(Arc::new(observer));

        runner.run(&context()).await.unwrap();
        let second = runner.run(&context()).await;

        assert!(matches!(second, Err(RunnerError::ProcessConsumed)));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
