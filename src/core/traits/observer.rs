use crate::core::domain::SuiteResult;

/// Listener for the lifecycle of a baseline run.
///
/// Progress is delivered inline while the process output is drained, so
/// implementations must return quickly.
#[mockall::automock]
pub trait Observer: std::fmt::Debug + Send + Sync {
    fn on_start_suite(&self);

    fn on_progress(&self, count: u32);

    fn on_stop_suite(&self, result: &SuiteResult);
}
