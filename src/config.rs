//! Configuration file support for the scaffold.
//!
//! Configuration files are free-form trees read from TOML, JSON or YAML and
//! kept as [`serde_json::Value`] so that default and custom files can be deep
//! merged regardless of their format. Typed views ([`ModeConfig`],
//! [`GitHooksConfig`]) are deserialised from the merged tree on demand; any key
//! they do not know is left alone for the bundler.

use crate::deep_merge::value_at_path;
use crate::error::{Result, ScaffoldError};
use crate::level::LevelRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file names, searched in order at the project root.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "scaffold.config.toml",
    "scaffold.config.json",
    "scaffold.config.yaml",
    "scaffold.config.yml",
];

/// Custom override file names, searched in order next to the default file.
pub const CUSTOM_CONFIG_FILES: &[&str] = &[
    "scaffold.custom.config.toml",
    "scaffold.custom.config.json",
    "scaffold.custom.config.yaml",
    "scaffold.custom.config.yml",
];

/// Environment variable holding the build mode.
pub const NODE_ENV: &str = "NODE_ENV";

/// Serialisation format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
}

impl ConfigFormat {
    /// Picks the format from the file extension. Unknown extensions are TOML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Toml,
        }
    }

    /// Parses `content` into a configuration tree.
    ///
    /// # Errors
    ///
    /// Returns the parser's error when `content` is malformed.
    pub fn parse(self, content: &str) -> Result<Value> {
        Ok(match self {
            Self::Toml => toml::from_str(content)?,
            Self::Json => serde_json::from_str(content)?,
            Self::Yaml => serde_yaml::from_str(content)?,
        })
    }
}

/// Load a configuration tree from a specific file path.
///
/// # Returns
///
/// Returns `Ok(None)` if the file doesn't exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_from_path(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ScaffoldError::io_error_with_source("read config file", path.to_path_buf(), e))?;

    let tree = ConfigFormat::from_path(path)
        .parse(&content)
        .map_err(|e| match e {
            ScaffoldError::ConfigError {
                message, source, ..
            } => ScaffoldError::ConfigError {
                message,
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        })?;

    match tree {
        Value::Object(_) => Ok(Some(tree)),
        Value::Null => Ok(Some(Value::Object(Map::new()))),
        _ => Err(ScaffoldError::config_error_with_path(
            "the top level of a configuration file must be a table",
            path.to_path_buf(),
        )),
    }
}

/// Build mode, selecting a section of the configuration tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// `development`, and anything unrecognised.
    #[default]
    Dev,
    /// `production` or `prod`.
    Prod,
    /// `test`
    Test,
}

impl BuildMode {
    /// Parses a mode name. Unknown names fall back to development.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Prod,
            "test" => Self::Test,
            _ => Self::Dev,
        }
    }

    /// Uses the explicit mode when given, else `NODE_ENV`, else development.
    #[must_use]
    pub fn resolve(explicit: Option<&str>) -> Self {
        match explicit {
            Some(name) => Self::from_name(name),
            None => std::env::var(NODE_ENV).map_or(Self::Dev, |v| Self::from_name(&v)),
        }
    }

    /// Name of the configuration section for this mode.
    #[must_use]
    pub const fn section(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
            Self::Test => "test",
        }
    }

    /// Canonical `NODE_ENV` spelling, also the key of remembered selections.
    #[must_use]
    pub const fn node_env(self) -> &'static str {
        match self {
            Self::Dev => "development",
            Self::Prod => "production",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node_env())
    }
}

/// When to ask the user which entries to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrysInquirer {
    /// Always (`true`) or only when asked on the command line (`false`).
    Enabled(bool),
    /// Ask when more than this many entries were discovered.
    Threshold(u64),
}

impl Default for EntrysInquirer {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

impl EntrysInquirer {
    /// Whether `discovered` entries warrant a prompt.
    #[must_use]
    pub const fn should_prompt(self, discovered: usize) -> bool {
        match self {
            Self::Enabled(enabled) => enabled,
            Self::Threshold(limit) => discovered as u64 > limit,
        }
    }
}

/// Per-mode build settings (`[dev]`, `[prod]`, `[test]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModeConfig {
    /// Entry filter: `true`, a name, `/regex/`, `{ regex = "..." }` or a list of these.
    #[serde(default)]
    pub app_entrys: Value,

    /// Interactive entry selection policy.
    #[serde(default)]
    pub entrys_inquirer: EntrysInquirer,

    /// Enable the bundler's filesystem cache.
    #[serde(default = "default_true")]
    pub use_filesystem_cache: bool,

    /// Source map style handed to the bundler.
    #[serde(default = "default_devtool")]
    pub devtool: String,

    /// Public URL prefix of emitted assets.
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Asset directory inside the output directory.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,

    /// Output directory, relative to the project root unless absolute.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Ask the bundler to minify HTML templates.
    #[serde(default)]
    pub minify_html_template: bool,

    /// Inject the debug tooling block into HTML templates.
    #[serde(default = "default_true")]
    pub inject_debug_tools: bool,

    /// Bundler command; the build plan path is appended as the last argument.
    #[serde(default)]
    pub bundler: Vec<String>,

    /// Extra bundler configuration passed through untouched.
    #[serde(default)]
    pub webpack_config: Value,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            app_entrys: Value::Null,
            entrys_inquirer: EntrysInquirer::default(),
            use_filesystem_cache: true,
            devtool: default_devtool(),
            public_path: default_public_path(),
            assets_dir: default_assets_dir(),
            output_dir: default_output_dir(),
            minify_html_template: false,
            inject_debug_tools: true,
            bundler: Vec::new(),
            webpack_config: Value::Null,
        }
    }
}

impl ModeConfig {
    /// Reads the section for `mode` from a resolved tree. A missing section
    /// yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the section has keys of the wrong type.
    pub fn from_tree(tree: &Value, mode: BuildMode) -> Result<Self> {
        section(tree, mode.section())
    }

    /// Output directory resolved against `root`.
    #[must_use]
    pub fn output_dir_in(&self, root: &Path) -> PathBuf {
        root.join(&self.output_dir)
    }
}

/// Commit-time quality gate settings (`[gitHooks]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitHooksConfig {
    /// Minimum lint level, by number or alias.
    #[serde(default)]
    pub level: LevelRef,

    /// Run the linter before committing.
    #[serde(default = "default_true")]
    pub use_eslint: bool,

    /// Lint command; selected files are appended.
    #[serde(default = "default_eslint_command")]
    pub eslint_command: Vec<String>,

    /// Globs selecting the changed files to lint.
    #[serde(default = "default_eslint_file_filter")]
    pub eslint_file_filter: Vec<String>,

    /// Globs of files that may be modified.
    #[serde(default = "default_allow_modifi")]
    pub allow_modifi: Vec<String>,

    /// Globs of files that may never be modified; wins over `allowModifi`.
    #[serde(default)]
    pub reject_modifi: Vec<String>,

    /// Glob to maximum size in KB.
    #[serde(default = "default_size_limit")]
    pub size_limit: BTreeMap<String, f64>,

    /// Glob to maximum newline count.
    #[serde(default = "default_line_limit")]
    pub line_limit: BTreeMap<String, u64>,

    /// Branches merged from `origin` before pushing.
    #[serde(default = "default_merge_before_push")]
    pub merge_before_push: Vec<String>,

    /// Install packages when the pre-push merge moved HEAD.
    #[serde(default = "default_true")]
    pub auto_install_package_after_merge: bool,

    /// Directories holding a `package.json`; defaults to the project root.
    #[serde(default)]
    pub package_paths: Vec<PathBuf>,

    /// Run the checks for merge commits too.
    #[serde(default)]
    pub enabled_merge_hooks: bool,

    /// Show desktop notifications.
    #[serde(default = "default_true")]
    pub allow_notify: bool,

    /// Audit log directory; defaults to `<root>/log`.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Work tree the hooks operate on; defaults to the project root.
    #[serde(default)]
    pub git_path: Option<PathBuf>,

    /// Master switch for every hook.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for GitHooksConfig {
    fn default() -> Self {
        Self {
            level: LevelRef::default(),
            use_eslint: true,
            eslint_command: default_eslint_command(),
            eslint_file_filter: default_eslint_file_filter(),
            allow_modifi: default_allow_modifi(),
            reject_modifi: Vec::new(),
            size_limit: default_size_limit(),
            line_limit: default_line_limit(),
            merge_before_push: default_merge_before_push(),
            auto_install_package_after_merge: true,
            package_paths: Vec::new(),
            enabled_merge_hooks: false,
            allow_notify: true,
            log_path: None,
            git_path: None,
            enabled: true,
        }
    }
}

impl GitHooksConfig {
    /// Reads `gitHooks` from a resolved tree. A missing section yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the section has keys of the wrong type.
    pub fn from_tree(tree: &Value) -> Result<Self> {
        section(tree, "gitHooks")
    }

    /// Audit log directory resolved against `root`.
    #[must_use]
    pub fn log_dir(&self, root: &Path) -> PathBuf {
        self.log_path
            .as_ref()
            .map_or_else(|| root.join("log"), |p| root.join(p))
    }

    /// Git work tree resolved against `root`.
    #[must_use]
    pub fn git_dir(&self, root: &Path) -> PathBuf {
        self.git_path
            .as_ref()
            .map_or_else(|| root.to_path_buf(), |p| root.join(p))
    }

    /// Package directories resolved against `root`.
    #[must_use]
    pub fn package_dirs(&self, root: &Path) -> Vec<PathBuf> {
        if self.package_paths.is_empty() {
            return vec![root.to_path_buf()];
        }
        self.package_paths.iter().map(|p| root.join(p)).collect()
    }
}

fn section<T: serde::de::DeserializeOwned + Default>(tree: &Value, key: &str) -> Result<T> {
    match value_at_path(tree, key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            ScaffoldError::config_error(format!("Invalid `{key}` section: {e}"))
        }),
    }
}

const fn default_true() -> bool {
    true
}

fn default_devtool() -> String {
    "source-map".to_string()
}

fn default_public_path() -> String {
    "./".to_string()
}

fn default_assets_dir() -> String {
    "static".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist").join("publish")
}

fn default_eslint_command() -> Vec<String> {
    ["npx", "eslint", "--format", "json"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_eslint_file_filter() -> Vec<String> {
    vec!["**/*.js".to_string()]
}

fn default_allow_modifi() -> Vec<String> {
    vec!["**".to_string()]
}

fn default_size_limit() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("**/src/**/*.{png,gif}".to_string(), 100.0),
        ("**/src/**/*.{jpg,jpeg}".to_string(), 300.0),
        ("**/src/**/*.svg".to_string(), 100.0),
    ])
}

fn default_line_limit() -> BTreeMap<String, u64> {
    BTreeMap::from([
        ("**/src/**/*.js".to_string(), 1200),
        ("**/src/**/*.vue".to_string(), 1200),
    ])
}

fn default_merge_before_push() -> Vec<String> {
    vec!["master".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    /// Helper to create a temporary config file with given content and extension
    fn create_temp_config_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut temp_file = Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("Failed to create temp file");
        temp_file
            .write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        temp_file
    }

    #[test]
    fn test_load_config_from_toml_file() {
        let temp_file = create_temp_config_file(
            ".toml",
            r#"
[dev]
appEntrys = ["demo"]

[gitHooks]
level = "merit"
"#,
        );

        let tree = load_config_from_path(temp_file.path())
            .expect("load should succeed")
            .expect("config should be present");
        assert_eq!(tree["dev"]["appEntrys"], json!(["demo"]));
        assert_eq!(tree["gitHooks"]["level"], json!("merit"));
    }

    #[test]
    fn test_load_config_from_json_and_yaml_files() {
        let json_file = create_temp_config_file(".json", r#"{"prod": {"appEntrys": true}}"#);
        let yaml_file = create_temp_config_file(".yml", "prod:\n  appEntrys: true\n");

        let from_json = load_config_from_path(json_file.path()).unwrap().unwrap();
        let from_yaml = load_config_from_path(yaml_file.path()).unwrap().unwrap();
        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn test_load_config_from_nonexistent_file_returns_none() {
        let fake_path = PathBuf::from("/nonexistent/path/to/scaffold.config.toml");
        let result = load_config_from_path(&fake_path);
        assert!(result.is_ok(), "missing config should not error");
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_load_config_from_invalid_file_fails_with_path() {
        let temp_file = create_temp_config_file(".toml", "[dev\nappEntrys = true\n");
        let err = load_config_from_path(temp_file.path()).unwrap_err();
        assert!(matches!(err, ScaffoldError::ConfigError { path: Some(_), .. }));
    }

    #[test]
    fn test_load_config_rejects_non_table_root() {
        let temp_file = create_temp_config_file(".json", "[1, 2]");
        assert!(load_config_from_path(temp_file.path()).is_err());
    }

    #[test]
    fn test_build_mode_from_name() {
        assert_eq!(BuildMode::from_name("production"), BuildMode::Prod);
        assert_eq!(BuildMode::from_name("prod"), BuildMode::Prod);
        assert_eq!(BuildMode::from_name("test"), BuildMode::Test);
        assert_eq!(BuildMode::from_name("development"), BuildMode::Dev);
        assert_eq!(BuildMode::from_name("staging"), BuildMode::Dev);
    }

    #[test]
    #[serial]
    fn test_build_mode_resolve_prefers_explicit_then_env() {
        let original = std::env::var_os(NODE_ENV);
        unsafe { std::env::set_var(NODE_ENV, "production") };

        let from_env = BuildMode::resolve(None);
        let explicit = BuildMode::resolve(Some("test"));

        match original {
            Some(v) => unsafe { std::env::set_var(NODE_ENV, v) },
            None => unsafe { std::env::remove_var(NODE_ENV) },
        }

        assert_eq!(from_env, BuildMode::Prod);
        assert_eq!(explicit, BuildMode::Test);
    }

    #[test]
    fn test_mode_config_defaults_when_section_missing() {
        let config = ModeConfig::from_tree(&json!({}), BuildMode::Dev).unwrap();
        assert_eq!(config, ModeConfig::default());
        assert_eq!(config.assets_dir, "static");
        assert!(config.use_filesystem_cache);
    }

    #[test]
    fn test_mode_config_reads_camel_case_keys() {
        let tree = json!({
            "prod": {
                "appEntrys": true,
                "entrysInquirer": 5,
                "useFilesystemCache": false,
                "outputDir": "out",
                "webpackConfig": {"devServer": {"port": "8088"}}
            }
        });
        let config = ModeConfig::from_tree(&tree, BuildMode::Prod).unwrap();
        assert_eq!(config.app_entrys, json!(true));
        assert_eq!(config.entrys_inquirer, EntrysInquirer::Threshold(5));
        assert!(!config.use_filesystem_cache);
        assert_eq!(config.output_dir_in(Path::new("/p")), PathBuf::from("/p/out"));
        assert_eq!(config.webpack_config["devServer"]["port"], json!("8088"));
    }

    #[test]
    fn test_mode_config_wrong_type_is_config_error() {
        let tree = json!({"dev": {"useFilesystemCache": "yes"}});
        let err = ModeConfig::from_tree(&tree, BuildMode::Dev).unwrap_err();
        assert!(err.to_string().contains("dev"));
    }

    #[test]
    fn test_entrys_inquirer_should_prompt() {
        assert!(EntrysInquirer::Enabled(true).should_prompt(0));
        assert!(!EntrysInquirer::Enabled(false).should_prompt(100));
        assert!(EntrysInquirer::Threshold(3).should_prompt(4));
        assert!(!EntrysInquirer::Threshold(3).should_prompt(3));
    }

    #[test]
    fn test_git_hooks_config_defaults() {
        let config = GitHooksConfig::from_tree(&json!({})).unwrap();
        assert_eq!(config.level, LevelRef::Alias("beginner".into()));
        assert!(config.use_eslint && config.enabled && config.allow_notify);
        assert!(!config.enabled_merge_hooks);
        assert_eq!(config.eslint_file_filter, vec!["**/*.js"]);
        assert_eq!(config.allow_modifi, vec!["**"]);
        assert_eq!(config.size_limit.get("**/src/**/*.{jpg,jpeg}"), Some(&300.0));
        assert_eq!(config.line_limit.get("**/src/**/*.vue"), Some(&1200));
        assert_eq!(config.merge_before_push, vec!["master"]);

        let root = Path::new("/proj");
        assert_eq!(config.log_dir(root), PathBuf::from("/proj/log"));
        assert_eq!(config.git_dir(root), PathBuf::from("/proj"));
        assert_eq!(config.package_dirs(root), vec![PathBuf::from("/proj")]);
    }

    #[test]
    fn test_git_hooks_config_partial_override() {
        let tree = json!({
            "gitHooks": {
                "level": 3,
                "rejectModifi": ["**/package.json"],
                "sizeLimit": {"**/*.png": 50},
                "packagePaths": ["web", "admin"]
            }
        });
        let config = GitHooksConfig::from_tree(&tree).unwrap();
        assert_eq!(config.level, LevelRef::Number(3));
        assert_eq!(config.reject_modifi, vec!["**/package.json"]);
        assert_eq!(config.size_limit.len(), 1);
        assert_eq!(config.line_limit, default_line_limit());
        assert_eq!(
            config.package_dirs(Path::new("/proj")),
            vec![PathBuf::from("/proj/web"), PathBuf::from("/proj/admin")]
        );
    }
}
