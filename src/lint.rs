//! External lint runner.
//!
//! The linter is an opaque command that prints an eslint-style JSON report:
//! an array of per-file results, each carrying `filePath` and `errorCount`.
//! Only those two keys are interpreted; every other key is kept as-is for the
//! lint log, except `source` which holds the whole file text.

use crate::error::{Result, ScaffoldError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::instrument;

/// Parsed lint report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LintReport {
    /// Per-file results with `source` removed.
    pub results: Vec<Value>,
    /// Sum of the per-file `errorCount`.
    pub error_count: u64,
}

impl LintReport {
    /// Parses the JSON array printed by the linter.
    ///
    /// # Errors
    ///
    /// Returns a `LintError` if `output` is not a JSON array.
    pub fn from_json(output: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(output.trim()).map_err(|e| ScaffoldError::LintError {
            message: "linter output is not valid JSON".to_string(),
            source: Some(Box::new(e)),
        })?;
        let Value::Array(results) = value else {
            return Err(ScaffoldError::lint_error("linter output is not a JSON array"));
        };
        Ok(Self::from_results(results))
    }

    /// Builds a report from raw per-file results.
    #[must_use]
    pub fn from_results(results: Vec<Value>) -> Self {
        let results: Vec<Value> = results
            .into_iter()
            .map(|mut r| {
                if let Value::Object(map) = &mut r {
                    map.remove("source");
                }
                r
            })
            .collect();
        let error_count = results.iter().map(error_count_of).sum();
        Self { results, error_count }
    }

    /// Files with at least one error, in report order.
    #[must_use]
    pub fn failing_files(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| error_count_of(r) > 0)
            .filter_map(|r| r.get("filePath").and_then(Value::as_str))
            .map(ToString::to_string)
            .collect()
    }

    /// The report as logged to `eslint.log.json`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(self.results.clone())
    }
}

fn error_count_of(result: &Value) -> u64 {
    result.get("errorCount").and_then(Value::as_u64).unwrap_or(0)
}

/// Lints a set of files.
pub trait LintRunner {
    /// Lints `files` and returns the parsed report.
    ///
    /// # Errors
    ///
    /// Returns an error if the linter cannot be run or its report parsed.
    fn lint(&self, files: &[PathBuf]) -> Result<LintReport>;
}

/// Runs a configured command line such as `npx eslint --format json`.
#[derive(Debug, Clone)]
pub struct CommandLintRunner {
    command: Vec<String>,
    cwd: PathBuf,
}

impl CommandLintRunner {
    /// Creates a runner executing `command` (program then arguments) in `cwd`.
    pub fn new(command: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            command,
            cwd: cwd.into(),
        }
    }
}

impl LintRunner for CommandLintRunner {
    #[instrument(skip(self, files), fields(files = files.len()), level = "debug")]
    fn lint(&self, files: &[PathBuf]) -> Result<LintReport> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(ScaffoldError::lint_error("lint command is empty"));
        };

        let output = Command::new(program)
            .args(args)
            .args(files)
            .current_dir(&self.cwd)
            .output()
            .map_err(|e| ScaffoldError::LintError {
                message: format!("failed to start `{program}`"),
                source: Some(Box::new(e)),
            })?;

        // A non-zero status only means lint errors were found.
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScaffoldError::lint_error(format!(
                "`{}` printed no report: {}",
                self.command.join(" "),
                stderr.trim()
            )));
        }
        LintReport::from_json(&stdout)
    }
}

/// Writes a report to `<log_dir>/eslint.log.json`.
///
/// # Errors
///
/// Returns an error if the log cannot be written.
pub fn write_lint_log(log_dir: &Path, report: &LintReport) -> Result<()> {
    crate::json_store::JsonStore::new(log_dir.join("eslint.log.json")).write(&report.to_json())
}
