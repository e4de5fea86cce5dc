use super::runner::{ProcessOutput, ProcessRunner, RunnerError};
use crate::config::{CommandSpec, ValidatorSettings};
use crate::error::{Result, ScrapegenError};
use crate::session::ValidationResult;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use strum::Display;
use tempfile::TempDir;

/// A pass/fail check applied to an assembled script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Gate {
    Static,
    Metadata,
    Structural,
}

/// A literal that must occur in the script source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuralCheck {
    pub marker: &'static str,
    pub error: &'static str,
}

/// Capabilities every generated script must expose, checked in this order.
pub const STRUCTURAL_CHECKS: [StructuralCheck; 3] = [
    StructuralCheck {
        marker: "async function collectProductUrls",
        error: "Missing collectProductUrls function",
    },
    StructuralCheck {
        marker: "async function extractProductData",
        error: "Missing extractProductData function",
    },
    StructuralCheck {
        marker: "yargs(hideBin(process.argv))",
        error: "Missing yargs command-line argument parsing",
    },
];

/// Runs the validation gates against a script copy in a private workspace.
///
/// Every call creates its own uniquely named directory and removes it before
/// returning. If the returned future is dropped early, the directory is
/// removed when the workspace guard drops.
pub struct ScriptValidator {
    runner: Arc<dyn ProcessRunner>,
    settings: ValidatorSettings,
    diagnostics: Regex,
}

impl ScriptValidator {
    /// # Errors
    ///
    /// Returns a config error if `diagnostic_pattern` is not a valid regex.
    pub fn new(runner: Arc<dyn ProcessRunner>, settings: ValidatorSettings) -> Result<Self> {
        let diagnostics = Regex::new(&settings.diagnostic_pattern).map_err(|e| {
            ScrapegenError::config(format!(
                "Invalid validator diagnostic_pattern '{}': {}",
                settings.diagnostic_pattern, e
            ))
        })?;
        Ok(Self {
            runner,
            settings,
            diagnostics,
        })
    }

    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    /// Validates `script`.
    ///
    /// # Errors
    ///
    /// Only for infrastructure failures: the workspace cannot be created,
    /// written or removed, or a checker process cannot be started.
    pub async fn validate(&self, script: &str) -> Result<ValidationResult> {
        let workspace = self.create_workspace()?;
        let script_path = workspace.path().join(&self.settings.script_file_name);
        tracing::debug!(workspace = %workspace.path().display(), "Created validation workspace");

        let outcome = match tokio::fs::write(&script_path, script).await {
            Ok(()) => self.run_gates(script, &script_path, workspace.path()).await,
            Err(e) => Err(ScrapegenError::io(format!(
                "Failed to write script to {}: {}",
                script_path.display(),
                e
            ))),
        };

        let workspace_path = workspace.path().to_path_buf();
        let cleanup = workspace.close();
        match (outcome, cleanup) {
            (Ok(result), Ok(())) => Ok(result),
            (Ok(_), Err(e)) => {
                tracing::error!(
                    workspace = %workspace_path.display(),
                    error = %e,
                    "Failed to remove validation workspace"
                );
                Err(ScrapegenError::io(format!(
                    "Failed to remove validation workspace {}: {}",
                    workspace_path.display(),
                    e
                )))
            }
            (Err(err), Err(e)) => {
                tracing::error!(
                    workspace = %workspace_path.display(),
                    error = %e,
                    "Failed to remove validation workspace"
                );
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
        }
    }

    fn create_workspace(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.settings.workspace_prefix);
        let workspace = match &self.settings.workspace_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        workspace.map_err(|e| {
            ScrapegenError::io(format!("Failed to create validation workspace: {}", e))
        })
    }

    async fn run_gates(
        &self,
        script: &str,
        script_path: &Path,
        workspace: &Path,
    ) -> Result<ValidationResult> {
        tracing::info!(gate = %Gate::Static, "Running validation gate");
        if let Some(error) = self.static_check(script_path, workspace).await? {
            return Ok(fail(Gate::Static, error));
        }

        tracing::info!(gate = %Gate::Metadata, "Running validation gate");
        if let Some(error) = self.metadata_check(script_path, workspace).await? {
            return Ok(fail(Gate::Metadata, error));
        }

        tracing::info!(gate = %Gate::Structural, "Running validation gate");
        if let Some(error) = structural_check(script) {
            return Ok(fail(Gate::Structural, error.to_string()));
        }

        tracing::info!("Script passed all validation gates");
        Ok(ValidationResult::valid())
    }

    /// Runs one checker. `Ok(Err(message))` is a gate failure (timeout), the
    /// outer error is an infrastructure failure.
    async fn run_command(
        &self,
        command: &CommandSpec,
        script_path: &Path,
        workspace: &Path,
    ) -> Result<std::result::Result<ProcessOutput, String>> {
        let args = command.args_for(script_path);
        match self
            .runner
            .run(&command.program, &args, workspace, self.settings.timeout())
            .await
        {
            Ok(output) => Ok(Ok(output)),
            Err(RunnerError::TimedOut(limit)) => Ok(Err(format!(
                "Command '{}' timed out after {}s",
                command.display(),
                limit.as_secs()
            ))),
            Err(RunnerError::Spawn(message)) => Err(ScrapegenError::process(format!(
                "Failed to run '{}': {}",
                command.display(),
                message
            ))),
        }
    }

    async fn static_check(&self, script_path: &Path, workspace: &Path) -> Result<Option<String>> {
        let output = match self
            .run_command(&self.settings.static_check, script_path, workspace)
            .await?
        {
            Ok(output) => output,
            Err(timeout) => return Ok(Some(timeout)),
        };

        let text = output.combined();
        if output.success() && !self.diagnostics.is_match(&text) {
            return Ok(None);
        }
        if text.is_empty() {
            Ok(Some(format!(
                "Static check failed with {}",
                describe_exit(output.exit_code)
            )))
        } else {
            Ok(Some(text))
        }
    }

    async fn metadata_check(
        &self,
        script_path: &Path,
        workspace: &Path,
    ) -> Result<Option<String>> {
        let output = match self
            .run_command(&self.settings.metadata_check, script_path, workspace)
            .await?
        {
            Ok(output) => output,
            Err(timeout) => return Ok(Some(timeout)),
        };

        if !output.success() {
            let detail = output.combined();
            return Ok(Some(if detail.is_empty() {
                format!("Metadata command failed with {}", describe_exit(output.exit_code))
            } else {
                format!(
                    "Metadata command failed with {}: {}",
                    describe_exit(output.exit_code),
                    detail
                )
            }));
        }

        Ok(check_metadata(
            &output.stdout,
            &self.settings.required_metadata_fields,
        ))
    }
}

fn fail(gate: Gate, error: String) -> ValidationResult {
    tracing::warn!(gate = %gate, error = %error, "Validation gate failed");
    ValidationResult::invalid(error)
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Returns an error message unless `stdout` is one JSON object carrying every
/// required field with a non-empty value.
fn check_metadata(stdout: &str, required: &[String]) -> Option<String> {
    let value: serde_json::Value = match serde_json::from_str(stdout.trim()) {
        Ok(value) => value,
        Err(e) => return Some(format!("Invalid metadata JSON: {e}")),
    };
    let Some(object) = value.as_object() else {
        return Some("Invalid metadata: expected a JSON object".to_string());
    };

    let missing: Vec<&str> = required
        .iter()
        .filter(|field| match object.get(field.as_str()) {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        })
        .map(String::as_str)
        .collect();

    if missing.is_empty() {
        None
    } else {
        Some(format!(
            "Invalid metadata: missing required fields: {}",
            missing.join(", ")
        ))
    }
}

fn structural_check(script: &str) -> Option<&'static str> {
    STRUCTURAL_CHECKS
        .iter()
        .find(|check| !script.contains(check.marker))
        .map(|check| check.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    const COMPLETE_SCRIPT: &str = "async function collectProductUrls(page, baseUrl) {}\n\
        async function extractProductData(page, url) {}\n\
        yargs(hideBin(process.argv)).parse();\n";

    #[derive(Debug, Clone)]
    struct Call {
        program: String,
        args: Vec<String>,
        cwd: PathBuf,
        script_existed: bool,
    }

    /// Replays canned responses and records every invocation.
    struct RecordingRunner {
        responses: Mutex<VecDeque<std::result::Result<ProcessOutput, RunnerError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingRunner {
        fn new(responses: Vec<std::result::Result<ProcessOutput, RunnerError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessRunner for RecordingRunner {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            cwd: &Path,
            _timeout: Duration,
        ) -> std::result::Result<ProcessOutput, RunnerError> {
            let script_existed = cwd.join("assembled-script.ts").exists();
            self.calls.lock().unwrap().push(Call {
                program: program.to_string(),
                args: args.to_vec(),
                cwd: cwd.to_path_buf(),
                script_existed,
            });
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ok("")))
        }
    }

    fn ok(stdout: &str) -> ProcessOutput {
        ProcessOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    fn failed(stdout: &str, code: i32) -> ProcessOutput {
        ProcessOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(code),
        }
    }

    const METADATA: &str =
        r#"{"name":"x","version":"1.0.0","target_url":"https://shop.test"}"#;

    fn validator(runner: Arc<RecordingRunner>) -> ScriptValidator {
        ScriptValidator::new(runner, ValidatorSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_passes_all_gates() {
        let runner = RecordingRunner::new(vec![Ok(ok("")), Ok(ok(METADATA))]);
        let result = validator(runner.clone()).validate(COMPLETE_SCRIPT).await.unwrap();

        assert_eq!(result, ValidationResult::valid());
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "npx");
        assert_eq!(calls[0].args[..2], ["tsc".to_string(), "--noEmit".to_string()]);
        assert!(calls[0].args[2].ends_with("assembled-script.ts"));
        assert_eq!(calls[1].args.last().map(String::as_str), Some("metadata"));
        assert!(calls.iter().all(|c| c.script_existed));
        assert_eq!(calls[0].cwd, calls[1].cwd);
        assert!(
            calls[0]
                .cwd
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("script-validation-")
        );
    }

    #[tokio::test]
    async fn test_static_failure_short_circuits() {
        let runner = RecordingRunner::new(vec![Ok(failed(
            "assembled-script.ts(3,5): error TS2304: Cannot find name 'foo'.",
            2,
        ))]);
        let result = validator(runner.clone()).validate(COMPLETE_SCRIPT).await.unwrap();

        assert!(!result.valid);
        assert!(result.error.unwrap().contains("TS2304"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_diagnostic_with_zero_exit_fails_static_gate() {
        let runner = RecordingRunner::new(vec![Ok(ok("x.ts(1,1): error TS1005: ';' expected."))]);
        let result = validator(runner.clone()).validate(COMPLETE_SCRIPT).await.unwrap();

        assert!(!result.valid);
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_metadata_missing_fields() {
        let runner = RecordingRunner::new(vec![Ok(ok("")), Ok(ok(r#"{"name":"x"}"#))]);
        let result = validator(runner).validate(COMPLETE_SCRIPT).await.unwrap();

        assert!(!result.valid);
        let error = result.error.unwrap();
        assert!(error.contains("version"), "{error}");
        assert!(error.contains("target_url"), "{error}");
        assert!(!error.contains("name,"), "{error}");
    }

    #[tokio::test]
    async fn test_metadata_not_json() {
        let runner = RecordingRunner::new(vec![Ok(ok("")), Ok(ok("Usage: scraper <command>"))]);
        let result = validator(runner).validate(COMPLETE_SCRIPT).await.unwrap();

        assert!(result.error.unwrap().starts_with("Invalid metadata JSON"));
    }

    #[tokio::test]
    async fn test_metadata_command_failure() {
        let mut output = failed("", 1);
        output.stderr = "ReferenceError: fetch is not defined".to_string();
        let runner = RecordingRunner::new(vec![Ok(ok("")), Ok(output)]);
        let result = validator(runner).validate(COMPLETE_SCRIPT).await.unwrap();

        let error = result.error.unwrap();
        assert!(error.contains("exit code 1"));
        assert!(error.contains("fetch is not defined"));
    }

    #[tokio::test]
    async fn test_structural_gate_names_missing_extraction_function() {
        let script = "async function collectProductUrls(page, baseUrl) {}\n\
            yargs(hideBin(process.argv)).parse();\n";
        let runner = RecordingRunner::new(vec![Ok(ok("")), Ok(ok(METADATA))]);
        let result = validator(runner).validate(script).await.unwrap();

        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Missing extractProductData function"));
    }

    #[tokio::test]
    async fn test_timeout_is_a_validation_failure() {
        let runner =
            RecordingRunner::new(vec![Err(RunnerError::TimedOut(Duration::from_secs(30)))]);
        let result = validator(runner.clone()).validate(COMPLETE_SCRIPT).await.unwrap();

        assert!(!result.valid);
        assert!(result.error.unwrap().contains("timed out after 30s"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_workspace_removed_after_every_outcome() {
        let outcomes = vec![
            vec![Ok(ok("")), Ok(ok(METADATA))],
            vec![Ok(failed("error TS1005", 2))],
            vec![Err(RunnerError::Spawn("npx: not found".to_string()))],
        ];

        for responses in outcomes {
            let runner = RecordingRunner::new(responses);
            let _ = validator(runner.clone()).validate(COMPLETE_SCRIPT).await;
            let calls = runner.calls();
            assert!(!calls.is_empty());
            assert!(!calls[0].cwd.exists(), "workspace {:?} left behind", calls[0].cwd);
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_propagates() {
        let runner =
            RecordingRunner::new(vec![Err(RunnerError::Spawn("npx: not found".to_string()))]);
        let err = validator(runner).validate(COMPLETE_SCRIPT).await.unwrap_err();
        assert!(matches!(err, ScrapegenError::Process(_)));
    }

    #[tokio::test]
    async fn test_workspaces_are_unique_per_call() {
        let runner = RecordingRunner::new(vec![Ok(failed("", 1)), Ok(failed("", 1))]);
        let validator = validator(runner.clone());
        validator.validate(COMPLETE_SCRIPT).await.unwrap();
        validator.validate(COMPLETE_SCRIPT).await.unwrap();

        let calls = runner.calls();
        assert_ne!(calls[0].cwd, calls[1].cwd);
    }

    #[test]
    fn test_invalid_diagnostic_pattern_is_config_error() {
        let settings = ValidatorSettings {
            diagnostic_pattern: "(".to_string(),
            ..Default::default()
        };
        let result = ScriptValidator::new(RecordingRunner::new(vec![]), settings);
        assert!(matches!(result, Err(ScrapegenError::Config(_))));
    }
}
