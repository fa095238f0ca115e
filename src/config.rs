use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::{
    constants::{LINE_SEPARATOR, POLL_INTERVAL_MS},
    core::{
        domain::{Limits, TestPointRequest},
        error::LimitError,
    },
};

/// Harness-wide settings that are not part of a single request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarnessConfig {
    pub poll_interval: Duration,
    pub line_separator: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            line_separator: LINE_SEPARATOR.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Limits(#[from] LimitError),
    #[error("poll interval must be positive")]
    ZeroPollInterval,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProbeKind {
    /// Memory figure reported by the runtime itself.
    Runtime,
    /// Resident set size of the harness process.
    Process,
}

/// Judge one test point of a program.
#[derive(Debug, Parser)]
#[command(name = "testpoint", version)]
pub struct Cli {
    /// Identifier echoed in logs and in the verdict
    pub point_id: String,
    /// Program artifact handed to the runtime
    pub program: PathBuf,
    /// Input payload, split into lines
    pub input: PathBuf,
    /// Expected output, compared verbatim
    pub expected_output: PathBuf,
    /// Time limit in milliseconds
    pub time_limit_ms: u64,
    /// Memory limit in kilobytes
    pub memory_limit_kb: u64,
    /// Run the program without turbo mode
    #[arg(long)]
    pub no_turbo: bool,
    #[arg(long, default_value_t = POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,
    #[arg(long, value_enum, default_value_t = ProbeKind::Runtime)]
    pub probe: ProbeKind,
}

impl Cli {
    pub fn limits(&self) -> Limits {
        Limits {
            time_ms: self.time_limit_ms,
            memory_bytes: self.memory_limit_kb.saturating_mul(1024),
        }
    }

    pub fn harness_config(&self) -> Result<HarnessConfig, ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(HarnessConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..HarnessConfig::default()
        })
    }

    /// Reads the referenced files and builds a validated request.
    pub async fn request(&self, config: &HarnessConfig) -> Result<TestPointRequest, ConfigError> {
        let limits = self.limits();
        limits.validate()?;

        let program = read_file(&self.program).await?;
        let input = String::from_utf8_lossy(&read_file(&self.input).await?).into_owned();
        let expected_output =
            String::from_utf8_lossy(&read_file(&self.expected_output).await?).into_owned();

        Ok(TestPointRequest {
            id: self.point_id.clone(),
            program,
            input_lines: split_input(&input, &config.line_separator),
            expected_output,
            limits,
            turbo_mode: !self.no_turbo,
        })
    }
}

pub fn split_input(input: &str, separator: &str) -> Vec<String> {
    input.split(separator).map(str::to_string).collect()
}

async fn read_file(path: &Path) -> Result<Vec<u8>, ConfigError> {
    tokio::fs::read(path).await.map_err(|source| ConfigError::Read {
        path: path.into(),
        source,
    })
}
