use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout and stderr joined, trimmed. Checkers disagree on which stream
    /// carries diagnostics.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (false, false) => format!("{stdout}\n{stderr}"),
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (true, true) => String::new(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// The process exceeded its time budget and was killed.
    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    /// The process could not be started or awaited.
    #[error("failed to run process: {0}")]
    Spawn(String),
}

/// Runs external commands on behalf of the validator.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        timeout: Duration,
    ) -> Result<ProcessOutput, RunnerError>;
}
