//! Configuration types.
//!
//! Every field has a default, so an empty or missing `config.toml` yields a
//! working setup. Loading the file is the infrastructure crate's job.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the path of the script under validation.
pub const SCRIPT_PLACEHOLDER: &str = "{script}";

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ScrapegenConfig {
    pub validator: ValidatorSettings,
    pub template: TemplateSettings,
    pub storage: StorageSettings,
}

/// An external command line. `{script}` in `args` is replaced per call.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Arguments with the script placeholder filled in.
    pub fn args_for(&self, script: &Path) -> Vec<String> {
        let script = script.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace(SCRIPT_PLACEHOLDER, &script))
            .collect()
    }

    /// Human-readable command line, used in logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `[validator]` section.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ValidatorSettings {
    /// Upper bound for each external process, in seconds.
    pub timeout_secs: u64,
    /// File name of the script copy inside the workspace.
    pub script_file_name: String,
    /// Prefix of the per-call workspace directory name.
    pub workspace_prefix: String,
    /// Parent directory for workspaces; the system temp dir when unset.
    pub workspace_root: Option<PathBuf>,
    pub static_check: CommandSpec,
    pub metadata_check: CommandSpec,
    /// Regex matched against checker output; a match fails the static gate
    /// even when the checker exits with status zero.
    pub diagnostic_pattern: String,
    pub required_metadata_fields: Vec<String>,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            script_file_name: "assembled-script.ts".to_string(),
            workspace_prefix: "script-validation-".to_string(),
            workspace_root: None,
            static_check: CommandSpec::new("npx", &["tsc", "--noEmit", SCRIPT_PLACEHOLDER]),
            metadata_check: CommandSpec::new("npx", &["ts-node", SCRIPT_PLACEHOLDER, "metadata"]),
            diagnostic_pattern: r"error TS\d+".to_string(),
            required_metadata_fields: vec![
                "name".to_string(),
                "version".to_string(),
                "target_url".to_string(),
            ],
        }
    }
}

impl ValidatorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[template]` section.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TemplateSettings {
    /// Base template file. The built-in template is used when unset.
    pub path: Option<PathBuf>,
}

/// `[storage]` section.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding one JSON document per session.
    pub sessions_dir: Option<PathBuf>,
    /// Directory receiving published scraper scripts.
    pub scrapers_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: ScrapegenConfig = toml::from_str("").unwrap();
        assert_eq!(config, ScrapegenConfig::default());
        assert_eq!(config.validator.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: ScrapegenConfig = toml::from_str(
            r#"
            [validator]
            timeout_secs = 5
            static_check = { program = "deno", args = ["check", "{script}"] }
            "#,
        )
        .unwrap();
        assert_eq!(config.validator.timeout_secs, 5);
        assert_eq!(config.validator.static_check.display(), "deno check {script}");
        assert_eq!(config.validator.script_file_name, "assembled-script.ts");
    }

    #[test]
    fn test_args_for_substitutes_script_path() {
        let spec = ValidatorSettings::default().metadata_check;
        let args = spec.args_for(Path::new("/tmp/ws/assembled-script.ts"));
        assert_eq!(args, vec!["ts-node", "/tmp/ws/assembled-script.ts", "metadata"]);
    }
}
