//! Commit gate.
//!
//! [`CommitGate`] runs the git-hook actions selected by the invocation flags:
//!
//! - `pre-push`: pull, merge the configured branches and reinstall packages
//!   when that moved HEAD.
//! - `commit-msg`: run the [`GateCheck`]s over the staged files in order,
//!   stopping at the first rejection.
//!
//! Every commit-msg run starts by clearing `gitHooks.log.json` in the log
//! directory; a rejection records the offending files under the check's log
//! key together with `logTime`.

use crate::argv::ArgvResolver;
use crate::check::{
    CheckContext, CheckOutcome, GateCheck, LineLimitCheck, LintLevelCheck, ModificationCheck, Rejection,
    SizeLimitCheck,
};
use crate::config::GitHooksConfig;
use crate::error::Result;
use crate::file_utils::find_executable;
use crate::git_utils::{get_changed_files, is_merge_message, latest_commit_hash, pull_and_merge, read_commit_message};
use crate::json_store::JsonStore;
use crate::level::{LevelScale, RandomRemarks, RemarkProvider};
use crate::lint::{CommandLintRunner, LintRunner};
use crate::notify::{Notifier, notifier_for};
use chrono::Local;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::instrument;

/// Audit log file name inside the log directory.
pub const AUDIT_LOG_FILE: &str = "gitHooks.log.json";

/// Invocation flag selecting the pre-push action.
pub const PRE_PUSH_FLAG: &str = "pre-push";

/// Invocation flag selecting the commit-msg checks.
pub const COMMIT_MSG_FLAG: &str = "commit-msg";

/// Package installer run after a pre-push merge.
pub const PACKAGE_INSTALLER: &str = "yarn";

const NOTIFIED_EXIT_DELAY: Duration = Duration::from_secs(5);
const QUIET_EXIT_DELAY: Duration = Duration::from_millis(200);

/// Outcome of a gate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// `gitHooks.enabled` is off.
    Disabled,
    /// Neither hook flag was passed.
    NoMatchingHook,
    /// The commit is a merge and merge hooks are off.
    MergeCommitSkipped,
    /// Every requested action succeeded.
    Passed,
    /// A check refused the commit.
    Rejected {
        /// The refusing check's verdict.
        rejection: Rejection,
        /// How long to wait before exiting so the notification can show.
        exit_delay: Duration,
    },
}

impl GateDecision {
    /// Whether the git operation must be aborted.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Process exit code for this decision.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.is_rejected() { 1 } else { 0 }
    }
}

/// Runs git-hook actions against one project.
pub struct CommitGate {
    root: PathBuf,
    config: GitHooksConfig,
    scale: LevelScale,
    runner: Box<dyn LintRunner>,
    notifier: Box<dyn Notifier>,
    remarks: Box<dyn RemarkProvider>,
}

impl CommitGate {
    /// Creates a gate with the configured lint command, the notifier chosen
    /// by `allowNotify`, the default level scale and random remarks.
    pub fn new(root: impl Into<PathBuf>, config: GitHooksConfig) -> Self {
        let root = root.into();
        let runner = CommandLintRunner::new(config.eslint_command.clone(), config.git_dir(&root));
        let notifier = notifier_for(config.allow_notify);
        Self {
            root,
            config,
            scale: LevelScale::default(),
            runner: Box::new(runner),
            notifier,
            remarks: Box::new(RandomRemarks::default()),
        }
    }

    /// Replaces the lint runner.
    #[must_use]
    pub fn with_lint_runner(mut self, runner: Box<dyn LintRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Replaces the notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replaces the remark provider.
    #[must_use]
    pub fn with_remarks(mut self, remarks: Box<dyn RemarkProvider>) -> Self {
        self.remarks = remarks;
        self
    }

    /// Replaces the level scale.
    #[must_use]
    pub fn with_scale(mut self, scale: LevelScale) -> Self {
        self.scale = scale;
        self
    }

    /// The gate settings.
    pub fn config(&self) -> &GitHooksConfig {
        &self.config
    }

    /// Directory receiving the audit and lint logs.
    pub fn log_dir(&self) -> PathBuf {
        self.config.log_dir(&self.root)
    }

    fn git_dir(&self) -> PathBuf {
        self.config.git_dir(&self.root)
    }

    /// Delay before exiting after a rejection: long enough for a desktop
    /// notification to appear, short when notifications are off.
    pub fn exit_delay(&self) -> Duration {
        if self.config.allow_notify {
            NOTIFIED_EXIT_DELAY
        } else {
            QUIET_EXIT_DELAY
        }
    }

    /// Runs the actions selected by `argv`: pre-push first, then commit-msg.
    ///
    /// # Errors
    ///
    /// Returns an error if git cannot be run or the audit log cannot be
    /// cleared.
    #[instrument(skip_all, level = "debug")]
    pub fn run(&self, argv: &ArgvResolver, msg_file: Option<&Path>) -> Result<GateDecision> {
        if !self.config.enabled {
            tracing::info!("Git hooks are disabled");
            return Ok(GateDecision::Disabled);
        }

        let pre_push = argv.has_flag(PRE_PUSH_FLAG);
        if pre_push {
            self.pre_push()?;
        }

        if argv.has_flag(COMMIT_MSG_FLAG) {
            return self.commit_msg(msg_file);
        }
        if pre_push {
            return Ok(GateDecision::Passed);
        }
        tracing::info!("no match any hooks");
        Ok(GateDecision::NoMatchingHook)
    }

    /// Pulls, merges `origin/<branch>` for every `mergeBeforePush` branch and
    /// installs packages when HEAD moved and `autoInstallPackageAfterMerge`
    /// is on.
    ///
    /// # Errors
    ///
    /// Returns an error if git cannot be run.
    pub fn pre_push(&self) -> Result<()> {
        let git_dir = self.git_dir();
        let before = latest_commit_hash(&git_dir)?;
        pull_and_merge(&git_dir, &self.config.merge_before_push)?;
        let after = latest_commit_hash(&git_dir)?;

        if before != after && self.config.auto_install_package_after_merge {
            tracing::info!(?before, ?after, "HEAD moved during merge, installing packages");
            self.install_packages();
        }
        Ok(())
    }

    fn install_packages(&self) {
        let Some(installer) = find_executable(PACKAGE_INSTALLER) else {
            tracing::warn!(installer = PACKAGE_INSTALLER, "Package installer not found, skipping install");
            return;
        };

        self.notifier
            .notify("Installing packages", "Dependencies changed after merging, running yarn");
        for dir in self.config.package_dirs(&self.root) {
            match Command::new(&installer).current_dir(&dir).status() {
                Ok(status) if status.success() => {
                    tracing::info!(dir = %dir.display(), "Packages installed");
                }
                Ok(status) => {
                    tracing::error!(dir = %dir.display(), code = ?status.code(), "Package install failed");
                }
                Err(e) => {
                    tracing::error!(dir = %dir.display(), error = %e, "Failed to start package installer");
                }
            }
        }
    }

    /// Gates a commit: skips merge commits unless merge hooks are on, then
    /// checks the staged files.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be read or the audit log
    /// cannot be cleared.
    pub fn commit_msg(&self, msg_file: Option<&Path>) -> Result<GateDecision> {
        let git_dir = self.git_dir();
        if !self.config.enabled_merge_hooks {
            let message = read_commit_message(&git_dir, msg_file).unwrap_or_default();
            if is_merge_message(&message) {
                tracing::info!("Merge commit, skipping checks");
                return Ok(GateDecision::MergeCommitSkipped);
            }
        }

        let files = get_changed_files(&git_dir)?;
        self.check_files(&files)
    }

    /// Runs every check over `files` in order and stops at the first
    /// rejection.
    ///
    /// A check that cannot run is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the audit log cannot be cleared.
    #[instrument(skip(self, files), fields(files = files.len()), level = "debug")]
    pub fn check_files(&self, files: &[PathBuf]) -> Result<GateDecision> {
        let log_dir = self.log_dir();
        let audit = JsonStore::new(log_dir.join(AUDIT_LOG_FILE));
        audit.write(&json!({}))?;

        let lint = LintLevelCheck::new(self.runner.as_ref(), &self.scale, self.remarks.as_ref());
        let checks: [&dyn GateCheck; 4] = [&ModificationCheck, &LineLimitCheck, &SizeLimitCheck, &lint];
        let ctx = CheckContext {
            files,
            config: &self.config,
            log_dir: &log_dir,
        };

        for check in checks {
            tracing::debug!(check = check.name(), "Running check");
            match check.run(&ctx) {
                Ok(CheckOutcome::Pass { notice }) => {
                    if let Some(notice) = notice {
                        self.notifier.notify("Commit check", &notice);
                    }
                }
                Ok(CheckOutcome::Reject(rejection)) => return Ok(self.reject(&audit, rejection)),
                Err(e) => {
                    tracing::error!(check = check.name(), error = %e, "Check could not run, skipping");
                }
            }
        }
        Ok(GateDecision::Passed)
    }

    fn reject(&self, audit: &JsonStore, rejection: Rejection) -> GateDecision {
        self.notifier.notify("Commit rejected", &rejection.message);

        if let Err(e) = audit.write_node(rejection.log_node, json!(rejection.files)) {
            tracing::warn!(error = %e, "Failed to record rejected files");
        }
        let log_time = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        if let Err(e) = audit.write_node("logTime", json!(log_time)) {
            tracing::warn!(error = %e, "Failed to record rejection time");
        }

        tracing::error!(check = rejection.check, "{}", rejection.message);
        GateDecision::Rejected {
            rejection,
            exit_delay: self.exit_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScaffoldError;
    use crate::lint::LintReport;
    use serde_json::Value;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct CountingRunner {
        error_count: u64,
        calls: Rc<RefCell<usize>>,
    }

    impl LintRunner for CountingRunner {
        fn lint(&self, files: &[PathBuf]) -> Result<LintReport> {
            *self.calls.borrow_mut() += 1;
            let results = files
                .iter()
                .map(|f| json!({"filePath": f.display().to_string(), "errorCount": self.error_count}))
                .collect();
            Ok(LintReport::from_results(results))
        }
    }

    struct BrokenRunner;

    impl LintRunner for BrokenRunner {
        fn lint(&self, _files: &[PathBuf]) -> Result<LintReport> {
            Err(ScaffoldError::lint_error("boom"))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier(Rc<RefCell<Vec<(String, String)>>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, message: &str) {
            self.0.borrow_mut().push((title.to_string(), message.to_string()));
        }
    }

    struct Setup {
        dir: TempDir,
        calls: Rc<RefCell<usize>>,
        notes: RecordingNotifier,
    }

    impl Setup {
        fn new() -> Self {
            Self {
                dir: TempDir::new().expect("Failed to create temp dir"),
                calls: Rc::new(RefCell::new(0)),
                notes: RecordingNotifier::default(),
            }
        }

        fn gate(&self, config: GitHooksConfig, error_count: u64) -> CommitGate {
            CommitGate::new(self.dir.path(), config)
                .with_lint_runner(Box::new(CountingRunner {
                    error_count,
                    calls: Rc::clone(&self.calls),
                }))
                .with_notifier(Box::new(self.notes.clone()))
        }

        fn write(&self, rel: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }

        fn audit(&self) -> Value {
            let text = fs::read_to_string(self.dir.path().join("log").join(AUDIT_LOG_FILE)).unwrap();
            serde_json::from_str(&text).unwrap()
        }
    }

    fn quiet() -> GitHooksConfig {
        GitHooksConfig {
            allow_notify: false,
            ..GitHooksConfig::default()
        }
    }

    #[test]
    fn test_clean_commit_passes_and_clears_audit_log() {
        let setup = Setup::new();
        setup.write("log/gitHooks.log.json", r#"{"sizeLimitFileList": ["old"]}"#);
        let file = setup.write("src/app.js", "let a = 1;\n");

        let decision = setup.gate(quiet(), 0).check_files(&[file]).unwrap();
        assert_eq!(decision, GateDecision::Passed);
        assert_eq!(decision.exit_code(), 0);
        assert_eq!(setup.audit(), json!({}));
        assert_eq!(*setup.calls.borrow(), 1);
    }

    #[test]
    fn test_first_failing_check_short_circuits() {
        let setup = Setup::new();
        let long = setup.write("src/long.js", &"x\n".repeat(5));
        let config = GitHooksConfig {
            line_limit: [("**/src/**/*.js".to_string(), 3)].into(),
            ..quiet()
        };

        let decision = setup.gate(config, 0).check_files(&[long.clone()]).unwrap();
        let GateDecision::Rejected { rejection, exit_delay } = decision else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.check, "line_limit");
        assert_eq!(exit_delay, QUIET_EXIT_DELAY);
        assert_eq!(*setup.calls.borrow(), 0, "lint must not run after an earlier rejection");

        let audit = setup.audit();
        assert_eq!(audit["lineLimitFileList"], json!([long.display().to_string()]));
        assert!(audit["logTime"].is_string());
        assert_eq!(setup.notes.0.borrow()[0].0, "Commit rejected");
    }

    #[test]
    fn test_modification_check_runs_first() {
        let setup = Setup::new();
        let file = setup.write("src/locked/big.js", &"x\n".repeat(5));
        let config = GitHooksConfig {
            reject_modifi: vec!["**/locked/**".to_string()],
            line_limit: [("**/src/**/*.js".to_string(), 3)].into(),
            ..quiet()
        };

        let decision = setup.gate(config, 0).check_files(&[file]).unwrap();
        let GateDecision::Rejected { rejection, .. } = decision else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.log_node, "notAllowModifiFileList");
        assert!(setup.audit().get("lineLimitFileList").is_none());
    }

    #[test]
    fn test_lint_score_above_highest_range_rejects() {
        let setup = Setup::new();
        let file = setup.write("src/app.js", "x\n");
        let config = GitHooksConfig {
            level: crate::level::LevelRef::Number(1),
            ..GitHooksConfig::default()
        };

        let gate = setup.gate(config, 150);
        let decision = gate.check_files(&[file]).unwrap();
        let GateDecision::Rejected { rejection, exit_delay } = decision else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.log_node, "eslintFileList");
        assert!(rejection.message.starts_with("Detected 150 errors."));
        assert_eq!(exit_delay, Duration::from_secs(5));
        assert!(setup.dir.path().join("log/eslint.log.json").exists());
    }

    #[test]
    fn test_passing_lint_notifies_with_remark() {
        let setup = Setup::new();
        let file = setup.write("src/app.js", "x\n");
        let decision = setup.gate(quiet(), 2).check_files(&[file]).unwrap();

        assert_eq!(decision, GateDecision::Passed);
        let notes = setup.notes.0.borrow();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].1.starts_with("Detected 2 errors."));
    }

    #[test]
    fn test_check_that_cannot_run_is_skipped() {
        let setup = Setup::new();
        let file = setup.write("src/app.js", "x\n");
        let gate = CommitGate::new(setup.dir.path(), quiet())
            .with_lint_runner(Box::new(BrokenRunner))
            .with_notifier(Box::new(setup.notes.clone()));

        assert_eq!(gate.check_files(&[file]).unwrap(), GateDecision::Passed);
    }

    #[test]
    fn test_disabled_gate_does_nothing() {
        let setup = Setup::new();
        let config = GitHooksConfig {
            enabled: false,
            ..quiet()
        };
        let argv = ArgvResolver::new(vec!["--commit-msg".to_string()]);
        assert_eq!(setup.gate(config, 0).run(&argv, None).unwrap(), GateDecision::Disabled);
        assert!(!setup.dir.path().join("log").exists());
    }

    #[test]
    fn test_no_hook_flag() {
        let setup = Setup::new();
        let argv = ArgvResolver::new(vec!["run".to_string(), "hooks".to_string()]);
        assert_eq!(setup.gate(quiet(), 0).run(&argv, None).unwrap(), GateDecision::NoMatchingHook);
    }

    #[test]
    fn test_merge_commit_is_skipped() {
        let setup = Setup::new();
        setup.write("MSG", "Merge branch 'master' into feature\n");
        let argv = ArgvResolver::new(vec!["--commit-msg".to_string()]);

        let decision = setup.gate(quiet(), 0).run(&argv, Some(Path::new("MSG"))).unwrap();
        assert_eq!(decision, GateDecision::MergeCommitSkipped);
        assert!(!setup.dir.path().join("log").exists());
    }

    #[test]
    fn test_exit_delay_follows_notify_setting() {
        let setup = Setup::new();
        assert_eq!(setup.gate(quiet(), 0).exit_delay(), QUIET_EXIT_DELAY);
        assert_eq!(setup.gate(GitHooksConfig::default(), 0).exit_delay(), NOTIFIED_EXIT_DELAY);
    }
}
