use std::process::Stdio;

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
    time::{Duration, Instant, timeout_at},
};
use tokio_stream::{StreamExt, wrappers::SplitStream};

use crate::core::{
    domain::{ProcessCommand, ProcessOutcome},
    traits::{
        adapter::Adapter,
        executor::{Execution, ExecutionError, ProcessExecutor, ProgressCallback},
    },
};

#[derive(Debug)]
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Test output is not guaranteed to be UTF-8, so each line is decoded lossily.
fn decode_line(raw: Vec<u8>) -> String {
    let line = String::from_utf8_lossy(&raw);
    line.strip_suffix('\r').unwrap_or(&line).to_string()
}

#[derive(Clone, Debug)]
pub struct NativeExecutor {
    timeout: Option<Duration>,
    stop_on_failure: bool,
}

impl NativeExecutor {
    pub fn new() -> Self {
        NativeExecutor {
            timeout: None,
            stop_on_failure: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stop_on_failure(mut self, stop_on_failure: bool) -> Self {
        self.stop_on_failure = stop_on_failure;
        self
    }

    fn timed_out(&self, command: &ProcessCommand) -> ExecutionError {
        ExecutionError::TimedOut {
            command: command.to_string(),
            timeout_ms: self.timeout.map_or(0, |t| t.as_millis() as u64),
        }
    }
}

impl Default for NativeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProcessExecutor for NativeExecutor {
    #[tracing::instrument(skip_all, fields(command = %command, adapter = adapter.name()))]
    async fn execute(
        &self,
        command: ProcessCommand,
        adapter: &dyn Adapter,
        on_progress: ProgressCallback,
    ) -> Result<Execution, ExecutionError> {
        let io_err = |source| ExecutionError::Io {
            command: command.to_string(),
            source,
        };

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let started_at = chrono::Utc::now();
        let start_time = Instant::now();
        let deadline = self.timeout.map(|t| start_time + t);

        let mut child = cmd.spawn().map_err(|e| ExecutionError::FailedToLaunch {
            command: command.to_string(),
            source: e,
        })?;
        tracing::debug!("Spawned test process {:?}", child.id());

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(io_err(std::io::Error::other("output pipes were not captured")));
        };
        let stdout_lines = SplitStream::new(BufReader::new(stdout).split(b'\n'))
            .map(|l| l.map(|raw| OutputLine::Stdout(decode_line(raw))));
        let stderr_lines = SplitStream::new(BufReader::new(stderr).split(b'\n'))
            .map(|l| l.map(|raw| OutputLine::Stderr(decode_line(raw))));
        let mut lines = stdout_lines.merge(stderr_lines);

        let mut captured_stdout = String::new();
        let mut captured_stderr = String::new();
        let mut passed = 0u32;
        let mut failing_line_seen = false;

        loop {
            let next = match deadline {
                Some(deadline) => match timeout_at(deadline, lines.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tracing::warn!("Test process timed out, killing it");
                        let _ = child.kill().await;
                        return Err(self.timed_out(&command));
                    }
                },
                None => lines.next().await,
            };
            let Some(line) = next else {
                break;
            };

            match line.map_err(io_err)? {
                OutputLine::Stdout(line) => {
                    let newly_passed = adapter.count_passed(&line);
                    if newly_passed > 0 {
                        passed = passed.saturating_add(newly_passed);
                        on_progress(passed);
                    }
                    if adapter.is_failure_line(&line) {
                        failing_line_seen = true;
                    }
                    captured_stdout.push_str(&line);
                    captured_stdout.push('\n');

                    if failing_line_seen && self.stop_on_failure {
                        tracing::debug!("Failing test reported, stopping test process");
                        let _ = child.start_kill();
                        break;
                    }
                }
                OutputLine::Stderr(line) => {
                    captured_stderr.push_str(&line);
                    captured_stderr.push('\n');
                }
            }
        }

        let status = match deadline {
            Some(deadline) => match timeout_at(deadline, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    let _ = child.kill().await;
                    return Err(self.timed_out(&command));
                }
            },
            None => child.wait().await,
        }
        .map_err(io_err)?;

        let outcome = ProcessOutcome {
            exit_code: status.code(),
            stdout: captured_stdout,
            stderr: captured_stderr,
            started_at,
            execution_time_ms: start_time.elapsed().as_millis() as u64,
        };
        let has_failure = failing_line_seen
            || !outcome.exited_successfully()
            || !adapter.is_output_ok(outcome.output());
        tracing::debug!(
            exit_code = ?outcome.exit_code,
            passed,
            has_failure,
            "Test process finished"
        );

        Ok(Execution {
            outcome,
            has_failure,
        })
    }
}
