//! Gate checks
//!
//! This module defines the [`GateCheck`] trait shared by every commit-time
//! check, and the four built-in checks the commit gate runs in order:
//!
//! 1. [`ModificationCheck`]: files outside `allowModifi` or inside `rejectModifi`
//! 2. [`LineLimitCheck`]: files with more lines than their `lineLimit` pattern allows
//! 3. [`SizeLimitCheck`]: files larger than their `sizeLimit` pattern allows
//! 4. [`LintLevelCheck`]: the lint error count must reach the configured level
//!
//! # Implementing a Custom Check
//!
//! ```rust
//! use scaffold_core::check::{CheckContext, CheckOutcome, GateCheck, Rejection};
//! use scaffold_core::error::Result;
//!
//! struct NoLockfileCheck;
//!
//! impl GateCheck for NoLockfileCheck {
//!     fn name(&self) -> &'static str {
//!         "no_lockfile"
//!     }
//!
//!     fn description(&self) -> &'static str {
//!         "Rejects commits touching package-lock.json"
//!     }
//!
//!     fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
//!         let files: Vec<String> = ctx
//!             .files
//!             .iter()
//!             .filter(|f| f.ends_with("package-lock.json"))
//!             .map(|f| f.display().to_string())
//!             .collect();
//!         if files.is_empty() {
//!             return Ok(CheckOutcome::pass());
//!         }
//!         Ok(CheckOutcome::Reject(Rejection::new(
//!             self.name(),
//!             "lockfileList",
//!             files,
//!             "package-lock.json must not be committed",
//!         )))
//!     }
//! }
//! ```

use crate::config::GitHooksConfig;
use crate::error::Result;
use crate::gate::AUDIT_LOG_FILE;
use crate::json_store::JsonStore;
use crate::level::{LevelScale, NO_LEVEL, RemarkProvider};
use crate::lint::{LintRunner, write_lint_log};
use crate::rule_filter::{filter_by_rule, line_count_exceeds, match_files, not_match_files, size_exceeds_kb};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

/// What a check sees of the commit being gated.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// Files about to be committed, as absolute paths.
    pub files: &'a [PathBuf],
    /// The `gitHooks` settings.
    pub config: &'a GitHooksConfig,
    /// Directory receiving the gate's JSON logs.
    pub log_dir: &'a Path,
}

/// Why a check refused the commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    /// Name of the refusing check.
    pub check: &'static str,
    /// Audit log key receiving `files`.
    pub log_node: &'static str,
    /// Offending files.
    pub files: Vec<String>,
    /// Message shown to the developer.
    pub message: String,
}

impl Rejection {
    /// Creates a rejection.
    pub fn new(
        check: &'static str,
        log_node: &'static str,
        files: Vec<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check,
            log_node,
            files,
            message: message.into(),
        }
    }
}

/// Result of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The commit may proceed; `notice` is shown to the developer if set.
    Pass {
        /// Optional message for the developer.
        notice: Option<String>,
    },
    /// The commit is refused.
    Reject(Rejection),
}

impl CheckOutcome {
    /// A silent pass.
    #[must_use]
    pub const fn pass() -> Self {
        Self::Pass { notice: None }
    }
}

/// Common trait for commit gate checks.
pub trait GateCheck {
    /// Identifier used in logs and rejections.
    fn name(&self) -> &'static str;

    /// One line on what the check enforces.
    fn description(&self) -> &'static str;

    /// Runs the check.
    ///
    /// # Errors
    ///
    /// Returns an error when the check itself cannot be carried out (for
    /// example the linter is missing). The gate logs it and moves on to the
    /// next check.
    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome>;
}

/// Audit log key listing the linted files.
const LINT_LOG_NODE: &str = "eslintFileList";

fn display_all(files: &[PathBuf]) -> Vec<String> {
    files.iter().map(|f| f.display().to_string()).collect()
}

/// Refuses files matching `rejectModifi` or not matching `allowModifi`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModificationCheck;

impl GateCheck for ModificationCheck {
    fn name(&self) -> &'static str {
        "modification"
    }

    fn description(&self) -> &'static str {
        "Only files allowed by allowModifi and not listed in rejectModifi may change"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
        let mut denied = match_files(ctx.files, &ctx.config.reject_modifi);
        for file in not_match_files(ctx.files, &ctx.config.allow_modifi) {
            if !denied.contains(&file) {
                denied.push(file);
            }
        }
        if denied.is_empty() {
            return Ok(CheckOutcome::pass());
        }

        let files = display_all(&denied);
        let message = format!("These files may not be modified: {}", files.join(", "));
        Ok(CheckOutcome::Reject(Rejection::new(
            self.name(),
            "notAllowModifiFileList",
            files,
            message,
        )))
    }
}

/// Refuses files with more newlines than their `lineLimit` pattern allows.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineLimitCheck;

impl GateCheck for LineLimitCheck {
    fn name(&self) -> &'static str {
        "line_limit"
    }

    fn description(&self) -> &'static str {
        "Files may not exceed the line count of their lineLimit pattern"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
        let over = filter_by_rule(ctx.files, &ctx.config.line_limit, |path, limit| {
            line_count_exceeds(path, *limit)
        });
        if over.is_empty() {
            return Ok(CheckOutcome::pass());
        }

        let files = display_all(&over);
        let message = format!("These files have too many lines: {}", files.join(", "));
        Ok(CheckOutcome::Reject(Rejection::new(
            self.name(),
            "lineLimitFileList",
            files,
            message,
        )))
    }
}

/// Refuses files larger than their `sizeLimit` pattern allows.
#[derive(Debug, Default, Clone, Copy)]
pub struct SizeLimitCheck;

impl GateCheck for SizeLimitCheck {
    fn name(&self) -> &'static str {
        "size_limit"
    }

    fn description(&self) -> &'static str {
        "Files may not exceed the size in KB of their sizeLimit pattern"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
        let over = filter_by_rule(ctx.files, &ctx.config.size_limit, |path, limit| {
            size_exceeds_kb(path, *limit)
        });
        if over.is_empty() {
            return Ok(CheckOutcome::pass());
        }

        let files = display_all(&over);
        let message = format!("These files are too large: {}", files.join(", "));
        Ok(CheckOutcome::Reject(Rejection::new(
            self.name(),
            "sizeLimitFileList",
            files,
            message,
        )))
    }
}

/// Lints the changed files and grades the error count against the level
/// scale.
///
/// Passes iff the count maps to a level above zero that is at least the
/// configured minimum. A count past the highest range maps to no level and
/// always fails. The lint report is written to `eslint.log.json` either way,
/// and any error at all records the linted files under `eslintFileList` in
/// the audit log, even when the commit passes.
pub struct LintLevelCheck<'a> {
    runner: &'a dyn LintRunner,
    scale: &'a LevelScale,
    remarks: &'a dyn RemarkProvider,
}

impl<'a> LintLevelCheck<'a> {
    /// Creates the check.
    pub fn new(runner: &'a dyn LintRunner, scale: &'a LevelScale, remarks: &'a dyn RemarkProvider) -> Self {
        Self {
            runner,
            scale,
            remarks,
        }
    }
}

impl GateCheck for LintLevelCheck<'_> {
    fn name(&self) -> &'static str {
        "lint_level"
    }

    fn description(&self) -> &'static str {
        "The lint error count must reach the configured level"
    }

    #[tracing::instrument(skip_all, level = "debug")]
    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
        if !ctx.config.use_eslint {
            return Ok(CheckOutcome::pass());
        }
        let targets = match_files(ctx.files, &ctx.config.eslint_file_filter);
        if targets.is_empty() {
            tracing::debug!("No changed files selected for linting");
            return Ok(CheckOutcome::pass());
        }

        let report = self.runner.lint(&targets)?;
        if let Err(e) = write_lint_log(ctx.log_dir, &report) {
            tracing::warn!(error = %e, "Failed to write lint log");
        }

        let linted = display_all(&targets);
        let score = report.error_count;
        if score > 0 {
            tracing::warn!(score, files = ?report.failing_files(), "Lint errors found");
            let audit = JsonStore::new(ctx.log_dir.join(AUDIT_LOG_FILE));
            if let Err(e) = audit.write_node(LINT_LOG_NODE, json!(linted)) {
                tracing::warn!(error = %e, "Failed to record linted files");
            }
        }

        let current = self.scale.get_level_by_score(score);
        let minimum = self.scale.resolve(&ctx.config.level);
        if minimum == NO_LEVEL {
            tracing::warn!(
                level = %ctx.config.level,
                "Configured level matches no level on the scale, no minimum applies"
            );
        }
        let remark = self.remarks.remark(self.scale, current, score);
        let message = format!("Detected {score} errors. {remark}").trim_end().to_string();
        tracing::info!(score, current, minimum, "Lint level");

        if current > 0 && current >= minimum {
            return Ok(CheckOutcome::Pass {
                notice: Some(message),
            });
        }
        Ok(CheckOutcome::Reject(Rejection::new(
            self.name(),
            LINT_LOG_NODE,
            linted,
            message,
        )))
    }
}
