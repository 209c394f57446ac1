//! Git utility functions for the commit gate.
//!
//! Read-only queries (changed files, HEAD hash) go through git2. Operations
//! that change the work tree (`pull`, `merge`) shell out to the `git` binary
//! so that the user's credentials and hooks configuration apply.

use crate::error::{Result, ScaffoldError};
use git2::{Delta, Repository, Status, StatusOptions};
use regex_lite::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::instrument;

/// Environment variable husky uses to pass the hook arguments.
pub const HUSKY_GIT_PARAMS: &str = "HUSKY_GIT_PARAMS";

/// Commit messages matching this are treated as merge commits.
const MERGE_MESSAGE_PATTERN: &str = r"^Merge[\s\S]{1,18}branch";

/// Opens the repository containing `git_dir`, searching parent directories
/// so that a package directory inside a larger repository works too.
fn open_repo(git_dir: &Path) -> Result<Repository> {
    Repository::discover(git_dir).map_err(|e| ScaffoldError::GitError {
        operation: "open repository".to_string(),
        repo_path: Some(git_dir.to_path_buf()),
        source: Some(Box::new(e)),
    })
}

/// Root of the work tree of `repo`, or `git_dir` for a bare repository.
fn work_tree(repo: &Repository, git_dir: &Path) -> PathBuf {
    repo.workdir().map_or_else(|| git_dir.to_path_buf(), Path::to_path_buf)
}

/// Lists the files about to be committed, as absolute paths.
///
/// Uses the staged diff of the index against HEAD (deleted files excluded).
/// When that yields nothing, falls back to the index status (new, modified
/// and renamed entries). Git reports paths relative to the work tree root,
/// which may be a parent of `git_dir`. Not being in a repository yields an
/// empty list.
///
/// # Errors
///
/// Returns an error only if the repository exists but cannot be read.
#[instrument(level = "debug", ret)]
pub fn get_changed_files(git_dir: &Path) -> Result<Vec<PathBuf>> {
    let repo = match Repository::discover(git_dir) {
        Ok(repo) => repo,
        Err(e) => {
            tracing::warn!(path = %git_dir.display(), error = %e, "Not a git repository, no changed files");
            return Ok(Vec::new());
        }
    };

    let mut files = match staged_diff(&repo) {
        Ok(files) => files,
        Err(e) => {
            tracing::debug!(error = %e, "Staged diff failed, falling back to status");
            Vec::new()
        }
    };
    if files.is_empty() {
        files = staged_status(&repo)?;
    }

    let root = work_tree(&repo, git_dir);
    Ok(files.into_iter().map(|f| root.join(f)).collect())
}

fn staged_diff(repo: &Repository) -> std::result::Result<Vec<PathBuf>, git2::Error> {
    let head_tree = match repo.head() {
        Ok(head) => Some(head.peel_to_tree()?),
        Err(_) => None,
    };
    let diff = repo.diff_tree_to_index(head_tree.as_ref(), None, None)?;
    Ok(diff
        .deltas()
        .filter(|d| d.status() != Delta::Deleted)
        .filter_map(|d| d.new_file().path().map(Path::to_path_buf))
        .collect())
}

fn staged_status(repo: &Repository) -> Result<Vec<PathBuf>> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(false).renames_head_to_index(true);
    let statuses = repo.statuses(Some(&mut opts))?;

    let wanted = Status::INDEX_NEW | Status::INDEX_MODIFIED | Status::INDEX_RENAMED | Status::WT_MODIFIED;
    Ok(statuses
        .iter()
        .filter(|s| s.status().intersects(wanted))
        .filter_map(|s| {
            s.head_to_index()
                .and_then(|d| d.new_file().path().map(Path::to_path_buf))
                .or_else(|| s.path().map(PathBuf::from))
        })
        .collect())
}

/// Returns the hash of the commit HEAD points to, if any.
///
/// # Errors
///
/// Returns an error if the repository cannot be opened.
pub fn latest_commit_hash(git_dir: &Path) -> Result<Option<String>> {
    let repo = open_repo(git_dir)?;
    let hash = repo
        .head()
        .ok()
        .and_then(|head| head.peel_to_commit().ok())
        .map(|commit| commit.id().to_string());
    Ok(hash)
}

/// Runs `git <args>` in `git_dir`, inheriting stdio.
///
/// Returns whether the command succeeded. A failing command is logged.
///
/// # Errors
///
/// Returns an error if `git` cannot be started.
#[instrument(level = "debug")]
pub fn run_git(git_dir: &Path, args: &[&str]) -> Result<bool> {
    let status = Command::new("git")
        .args(args)
        .current_dir(git_dir)
        .status()
        .map_err(|e| ScaffoldError::git_error(format!("git {} failed to start: {}", args.join(" "), e)))?;

    if !status.success() {
        tracing::error!(command = %args.join(" "), code = ?status.code(), "git command failed");
    }
    Ok(status.success())
}

/// Pulls, then merges `origin/<branch>` for each branch in order.
///
/// # Errors
///
/// Returns an error if `git` cannot be started.
pub fn pull_and_merge(git_dir: &Path, branches: &[String]) -> Result<()> {
    run_git(git_dir, &["pull"])?;
    for branch in branches {
        let remote = format!("origin/{branch}");
        run_git(git_dir, &["merge", &remote])?;
    }
    Ok(())
}

/// Reads the commit message being validated.
///
/// The message file is `msg_file` when given, else the first word of
/// `HUSKY_GIT_PARAMS`; relative paths are resolved against `git_dir`, then
/// against the root of its work tree.
/// Returns `None` when no message file is known or it cannot be read.
#[must_use]
pub fn read_commit_message(git_dir: &Path, msg_file: Option<&Path>) -> Option<String> {
    let file = match msg_file {
        Some(f) => f.to_path_buf(),
        None => {
            let params = std::env::var(HUSKY_GIT_PARAMS).ok()?;
            PathBuf::from(params.split_whitespace().next()?)
        }
    };
    let mut path = git_dir.join(&file);
    if !path.exists() && file.is_relative() {
        // Hooks run from the work tree root, so their paths are relative to it.
        if let Ok(repo) = Repository::discover(git_dir) {
            path = work_tree(&repo, git_dir).join(&file);
        }
    }
    match fs::read_to_string(&path) {
        Ok(msg) => Some(msg),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read commit message");
            None
        }
    }
}

/// Whether `message` is a merge commit message such as
/// `Merge branch 'master' into feature` or `Merge remote-tracking branch ...`.
#[must_use]
pub fn is_merge_message(message: &str) -> bool {
    Regex::new(MERGE_MESSAGE_PATTERN).is_ok_and(|re| re.is_match(message))
}
