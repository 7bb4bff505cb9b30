use std::panic;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::core::runner::Runner;
use crate::native::executor::NativeExecutor;
use crate::observers::LoggingObserver;

mod adapters;
mod config;
mod constants;
mod core;
mod coverage;
mod native;
mod observers;

#[cfg(test)]
mod stubs;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    set_panic_hook();

    let config = Config::from_env()?;
    tracing::debug!("Loaded configuration: {:?}", config);
    tokio::fs::create_dir_all(&config.cache_dir).await?;

    let context = config.suite_context();
    let executor = NativeExecutor::new()
        .with_timeout(config.timeout)
        .with_stop_on_failure(config.stop_on_failure);

    let mut runner = Runner::new(
        config.adapter.build(),
        config.process_command(),
        &config.coverage_log_file,
    )
    .with_executor(Arc::new(executor));
    runner.add_observer(Arc::new(LoggingObserver::new(context.run_id)));

    let result = runner.run(&context).await?;

    if result.has_failure() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
