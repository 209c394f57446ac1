//! Layered configuration loading.
//!
//! Configuration is resolved from up to two files, with later sources
//! overriding earlier ones key by key (see [`crate::deep_merge`]):
//!
//! ```text
//! Default config: <root>/scaffold.config.toml, or the file given with --config
//!     ↓
//! Custom config:  <root>/scaffold.custom.config.toml, or `customConfigFilePath`
//! ```
//!
//! The custom file is meant to stay out of version control so that each
//! developer can tune entries, ports and hooks without touching shared
//! settings. Missing files are not errors.
//!
//! # Usage
//!
//! ```no_run
//! # use scaffold_core::config_hierarchy::{find_project_root, load_hierarchical_config};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = find_project_root(&std::env::current_dir()?);
//! let hierarchical = load_hierarchical_config(&root, None)?;
//!
//! for source in &hierarchical.sources {
//!     println!("Loaded {:?} config from: {}", source.source_type, source.path.display());
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::{
    BuildMode, CUSTOM_CONFIG_FILES, DEFAULT_CONFIG_FILES, GitHooksConfig, ModeConfig,
    load_config_from_path,
};
use crate::deep_merge::{merge, value_at_path};
use crate::error::{Result, ScaffoldError};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key of the default file naming an alternative custom file.
pub const CUSTOM_CONFIG_PATH_KEY: &str = "customConfigFilePath";

/// Configuration source type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSourceType {
    /// The project's default configuration file.
    Default,

    /// Explicitly specified via CLI `--config` flag, in place of the default file.
    CliExplicit,

    /// The developer's custom override file.
    Custom,
}

/// A single configuration file that was loaded.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// The type of configuration source.
    pub source_type: ConfigSourceType,

    /// The path to the configuration file.
    pub path: PathBuf,

    /// The parsed configuration tree from this source.
    pub config: Value,
}

impl ConfigSource {
    /// Creates a new configuration source.
    #[must_use]
    pub const fn new(source_type: ConfigSourceType, path: PathBuf, config: Value) -> Self {
        Self {
            source_type,
            path,
            config,
        }
    }
}

/// Hierarchical configuration result.
///
/// Contains all configuration sources that were loaded, the project root they
/// were resolved against, and the final merged tree.
#[derive(Debug, Clone)]
pub struct HierarchicalConfig {
    /// Project root.
    pub root: PathBuf,

    /// All configuration sources that were loaded, in priority order.
    pub sources: Vec<ConfigSource>,

    /// The merged configuration tree.
    pub merged: Value,
}

impl HierarchicalConfig {
    /// Creates a new hierarchical configuration result.
    #[must_use]
    pub const fn new(root: PathBuf, sources: Vec<ConfigSource>, merged: Value) -> Self {
        Self {
            root,
            sources,
            merged,
        }
    }

    /// Typed settings for `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mode section is malformed.
    pub fn mode_config(&self, mode: BuildMode) -> Result<ModeConfig> {
        ModeConfig::from_tree(&self.merged, mode)
    }

    /// Typed git hook settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the `gitHooks` section is malformed.
    pub fn git_hooks(&self) -> Result<GitHooksConfig> {
        GitHooksConfig::from_tree(&self.merged)
    }

    /// The merged value at a dotted path; an empty path is the whole tree.
    #[must_use]
    pub fn value_at(&self, path: &str) -> Option<&Value> {
        value_at_path(&self.merged, path)
    }
}

/// Finds the git work tree containing `start`.
///
/// Uses git2 to discover the repository by searching upward.
///
/// # Returns
///
/// * `Ok(Some(PathBuf))` - if inside a git repository with a work tree
/// * `Ok(None)` - if not in a git repository
/// * `Err(ScaffoldError)` - if an error occurs while searching
#[tracing::instrument(level = "debug")]
pub fn find_git_repo_root(start: &Path) -> Result<Option<PathBuf>> {
    match git2::Repository::discover(start) {
        Ok(repo) => Ok(repo.workdir().map(PathBuf::from)),
        Err(e) => {
            // "not a repository" surfaces as either of these
            if e.class() == git2::ErrorClass::Config || e.code() == git2::ErrorCode::NotFound {
                Ok(None)
            } else {
                Err(ScaffoldError::git_error_with_repo(
                    "find repository root",
                    start.to_path_buf(),
                ))
            }
        }
    }
}

/// Picks the project root for `cwd`.
///
/// `cwd` itself when it holds a `package.json` or a configuration file, else
/// the enclosing git work tree, else `cwd`.
#[must_use]
pub fn find_project_root(cwd: &Path) -> PathBuf {
    let marks_root = std::iter::once("package.json")
        .chain(DEFAULT_CONFIG_FILES.iter().copied())
        .any(|name| cwd.join(name).is_file());
    if marks_root {
        return cwd.to_path_buf();
    }
    match find_git_repo_root(cwd) {
        Ok(Some(root)) => root,
        Ok(None) => cwd.to_path_buf(),
        Err(e) => {
            tracing::debug!(error = %e, "Git discovery failed, using the current directory");
            cwd.to_path_buf()
        }
    }
}

fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|n| dir.join(n)).find(|p| p.is_file())
}

/// Loads and merges the default and custom configuration files under `root`.
///
/// If `cli_explicit_path` is provided it replaces the default file and must
/// exist. The custom file is looked up next to the default file, or at the
/// path named by its `customConfigFilePath` key.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be parsed, or if the
/// explicit path does not exist.
#[tracing::instrument(level = "debug")]
pub fn load_hierarchical_config(
    root: &Path,
    cli_explicit_path: Option<&Path>,
) -> Result<HierarchicalConfig> {
    let mut sources = Vec::new();

    let (default_type, default_path) = match cli_explicit_path {
        Some(path) => (ConfigSourceType::CliExplicit, Some(root.join(path))),
        None => (ConfigSourceType::Default, first_existing(root, DEFAULT_CONFIG_FILES)),
    };

    let mut custom_path = None;
    match default_path {
        Some(path) => match load_config_from_path(&path)? {
            Some(config) => {
                let base_dir = path.parent().unwrap_or(root).to_path_buf();
                custom_path = config
                    .get(CUSTOM_CONFIG_PATH_KEY)
                    .and_then(Value::as_str)
                    .map(|p| base_dir.join(p));
                if custom_path.is_none() {
                    custom_path = first_existing(&base_dir, CUSTOM_CONFIG_FILES);
                }
                sources.push(ConfigSource::new(default_type, path, config));
            }
            None if default_type == ConfigSourceType::CliExplicit => {
                return Err(ScaffoldError::config_error_with_path(
                    "configuration file given with --config does not exist",
                    path,
                ));
            }
            None => {}
        },
        None => {
            tracing::warn!(root = %root.display(), "No scaffold.config file found, using built-in defaults");
            custom_path = first_existing(root, CUSTOM_CONFIG_FILES);
        }
    }

    if let Some(path) = custom_path {
        match load_config_from_path(&path)? {
            Some(config) => sources.push(ConfigSource::new(ConfigSourceType::Custom, path, config)),
            None => {
                tracing::warn!(path = %path.display(), "Custom config file not found, skipping");
            }
        }
    }

    let trees: Vec<Value> = sources.iter().map(|s| s.config.clone()).collect();
    let merged = match merge(&trees) {
        Value::Null => Value::Object(Map::new()),
        tree => tree,
    };

    for source in &sources {
        tracing::debug!(kind = ?source.source_type, path = %source.path.display(), "Loaded config source");
    }

    Ok(HierarchicalConfig::new(root.to_path_buf(), sources, merged))
}
