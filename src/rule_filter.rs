//! Glob-keyed file rules.
//!
//! A [`RuleSet`] maps glob patterns to an opaque condition value such as a size
//! threshold. [`filter_by_rule`] keeps the files matched by a pattern whose
//! condition evaluator returns `true` for them. The same glob helpers back the
//! lint file selection and the modification permission check.

use crate::error::{Result, ScaffoldError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Glob pattern to condition value.
pub type RuleSet<T> = BTreeMap<String, T>;

/// Builds a matcher over `patterns`.
///
/// # Errors
///
/// Returns an error if any pattern is not a valid glob.
pub fn build_glob_set<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.as_ref())?);
    }
    Ok(builder.build()?)
}

/// Keeps the files matching at least one of `patterns`, in input order.
///
/// Invalid patterns are logged and skipped.
#[must_use]
pub fn match_files<S: AsRef<str>>(files: &[PathBuf], patterns: &[S]) -> Vec<PathBuf> {
    let set = lenient_glob_set(patterns);
    files.iter().filter(|f| set.is_match(f)).cloned().collect()
}

/// Keeps the files matching none of `patterns`, in input order.
///
/// Invalid patterns are logged and skipped.
#[must_use]
pub fn not_match_files<S: AsRef<str>>(files: &[PathBuf], patterns: &[S]) -> Vec<PathBuf> {
    let set = lenient_glob_set(patterns);
    files.iter().filter(|f| !set.is_match(f)).cloned().collect()
}

fn lenient_glob_set<S: AsRef<str>>(patterns: &[S]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern.as_ref()) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!(pattern = pattern.as_ref(), error = %e, "Skipping invalid glob"),
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to build glob set, matching nothing");
        GlobSet::empty()
    })
}

/// Applies `rules` to `files` and returns the files whose condition holds.
///
/// Files matching no pattern are never returned. For every pattern the
/// evaluator is called once per matching file with that pattern's condition
/// value; an evaluator error is logged and counts as "no match" for that file
/// only. A file reported by several patterns appears once, at its first
/// position.
pub fn filter_by_rule<T, F>(files: &[PathBuf], rules: &RuleSet<T>, mut condition: F) -> Vec<PathBuf>
where
    F: FnMut(&Path, &T) -> Result<bool>,
{
    let mut result: Vec<PathBuf> = Vec::new();
    if files.is_empty() || rules.is_empty() {
        return result;
    }

    let patterns: Vec<&String> = rules.keys().collect();
    let candidates = match_files(files, &patterns);
    if candidates.is_empty() {
        return result;
    }

    for (pattern, value) in rules {
        let matched = match_files(&candidates, std::slice::from_ref(pattern));
        for file in matched {
            match condition(&file, value) {
                Ok(true) if !result.contains(&file) => result.push(file),
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(path = %file.display(), pattern = %pattern, error = %e, "Rule condition failed");
                }
            }
        }
    }
    result
}

/// True when the file at `path` is larger than `limit_kb` kilobytes
/// (1 KB = 1024 bytes). A missing file never exceeds.
///
/// # Errors
///
/// Returns an error if the file exists but its metadata cannot be read.
pub fn size_exceeds_kb(path: &Path, limit_kb: f64) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let meta = fs::metadata(path)
        .map_err(|e| ScaffoldError::io_error_with_source("read file metadata", path.to_path_buf(), e))?;
    #[allow(clippy::cast_precision_loss)]
    let size_kb = meta.len() as f64 / 1024.0;
    Ok(size_kb > limit_kb)
}

/// True when the file at `path` holds more than `limit` newline characters.
/// A missing file never exceeds.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn line_count_exceeds(path: &Path, limit: u64) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let bytes = fs::read(path).map_err(|e| ScaffoldError::io_error_with_source("read file", path.to_path_buf(), e))?;
    let newlines = bytes.iter().filter(|b| **b == b'\n').count() as u64;
    Ok(newlines > limit)
}
