//! [`ProcessRunner`] backed by `tokio::process`.

use async_trait::async_trait;
use scrapegen_core::validation::{ProcessOutput, ProcessRunner, RunnerError};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Spawns each command directly (no shell) and kills it when the time budget
/// runs out.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        timeout: Duration,
    ) -> Result<ProcessOutput, RunnerError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the output future on timeout must not leave the child running.
            .kill_on_drop(true);

        tracing::debug!(program, ?args, cwd = %cwd.display(), "Spawning process");

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| {
                tracing::error!(program, error = %e, "Failed to spawn process");
                RunnerError::Spawn(format!("{}: {}", program, e))
            })?,
            Err(_) => {
                tracing::warn!(program, timeout_secs = timeout.as_secs(), "Process timed out");
                return Err(RunnerError::TimedOut(timeout));
            }
        };

        let result = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        tracing::debug!(program, exit_code = ?result.exit_code, "Process finished");
        Ok(result)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_captures_streams_and_exit_code() {
        let dir = TempDir::new().unwrap();
        let output = TokioProcessRunner::new()
            .run(
                "sh",
                &["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()],
                dir.path(),
                Duration::from_secs(10),
            )
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert_eq!(output.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_runs_in_the_given_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let output = TokioProcessRunner::new()
            .run("cat", &["marker.txt".to_string()], dir.path(), Duration::from_secs(10))
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "here");
    }

    #[tokio::test]
    async fn test_timeout() {
        let dir = TempDir::new().unwrap();
        let err = TokioProcessRunner::new()
            .run("sleep", &["5".to_string()], dir.path(), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert_eq!(err, RunnerError::TimedOut(Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let dir = TempDir::new().unwrap();
        let err = TokioProcessRunner::new()
            .run("scrapegen-no-such-binary", &[], dir.path(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::Spawn(_)));
    }
}
