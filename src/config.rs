use std::path::PathBuf;
use std::time::Duration;

use crate::{
    adapters::AdapterKind,
    constants::{COVERAGE_DATA_FILE, DEFAULT_CACHE_DIR_NAME},
    core::domain::{ProcessCommand, SuiteContext},
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to resolve the current directory: {0}")]
    CurrentDir(#[from] std::io::Error),
}

/// Baseline run settings, read from `BASELINE_*` environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    pub command: Vec<String>,
    pub adapter: AdapterKind,
    pub working_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub coverage_log_file: PathBuf,
    pub collect_coverage: bool,
    pub timeout: Option<Duration>,
    pub stop_on_failure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let command: Vec<String> = lookup("BASELINE_COMMAND")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        if command.is_empty() {
            return Err(ConfigError::Missing {
                name: "BASELINE_COMMAND",
            });
        }

        let adapter = match lookup("BASELINE_ADAPTER") {
            Some(value) => value.parse::<AdapterKind>().map_err(|reason| ConfigError::Invalid {
                name: "BASELINE_ADAPTER",
                value,
                reason,
            })?,
            None => AdapterKind::Libtest,
        };

        let working_dir = match lookup("BASELINE_WORKDIR") {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()?,
        };
        let cache_dir = lookup("BASELINE_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME));
        let coverage_log_file = lookup("BASELINE_COVERAGE_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| cache_dir.join(COVERAGE_DATA_FILE));

        let collect_coverage = parse_flag(&lookup, "BASELINE_COLLECT_COVERAGE", true)?;
        let stop_on_failure = parse_flag(&lookup, "BASELINE_STOP_ON_FAILURE", true)?;

        let timeout = lookup("BASELINE_TIMEOUT_MS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|e| ConfigError::Invalid {
                        name: "BASELINE_TIMEOUT_MS",
                        value,
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        Ok(Config {
            command,
            adapter,
            working_dir,
            cache_dir,
            coverage_log_file,
            collect_coverage,
            timeout,
            stop_on_failure,
        })
    }

    pub fn process_command(&self) -> ProcessCommand {
        let mut command = ProcessCommand::new(&self.command[0]).current_dir(&self.working_dir);
        for arg in &self.command[1..] {
            command = command.arg(arg);
        }
        command
    }

    pub fn suite_context(&self) -> SuiteContext {
        let mut context = SuiteContext::new(&self.cache_dir);
        context.collect_coverage = self.collect_coverage;
        context
    }
}

fn parse_flag<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                name,
                value,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}
