//! Integration tests for layered configuration loading.
//!
//! These tests verify end-to-end behavior of configuration discovery,
//! including:
//! - Default and custom files in different formats
//! - A custom file redirected with `customConfigFilePath`
//! - An explicit `--config` file
//! - Project root discovery inside a real git repository

use scaffold_core::config::{BuildMode, EntrysInquirer};
use scaffold_core::config_hierarchy::{
    ConfigSourceType, find_git_repo_root, find_project_root, load_hierarchical_config,
};
use scaffold_core::level::LevelRef;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Helper to create a temporary config file with content.
fn create_temp_config_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let config_path = dir.join(name);
    fs::create_dir_all(config_path.parent().expect("config has parent"))
        .expect("Failed to create config dir");
    fs::write(&config_path, content).expect("Failed to write config");
    config_path
}

/// Helper to initialize a git repository, returning `false` when git is not
/// installed.
fn init_git_repo(dir: &Path) -> bool {
    let Ok(status) = Command::new("git").arg("init").current_dir(dir).status() else {
        return false;
    };
    assert!(status.success(), "git init failed with status: {status:?}");
    true
}

#[test]
fn integration_json_default_with_yaml_custom() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    create_temp_config_file(
        temp_dir.path(),
        "scaffold.config.json",
        r#"{
  "dev": {
    "appEntrys": true,
    "entrysInquirer": 5,
    "webpackConfig": { "devServer": { "port": 8080, "open": true } }
  },
  "gitHooks": { "level": 3, "rejectModifi": ["**/vendor/**"] }
}"#,
    );
    create_temp_config_file(
        temp_dir.path(),
        "scaffold.custom.config.yaml",
        r"
dev:
  webpackConfig:
    devServer:
      port: 9000
gitHooks:
  allowNotify: false
",
    );

    let hierarchical =
        load_hierarchical_config(temp_dir.path(), None).expect("load_hierarchical_config should succeed");

    assert_eq!(hierarchical.sources.len(), 2, "should load the default and the custom file");
    assert_eq!(hierarchical.sources[0].source_type, ConfigSourceType::Default);
    assert_eq!(hierarchical.sources[1].source_type, ConfigSourceType::Custom);

    assert_eq!(
        hierarchical.value_at("dev.webpackConfig.devServer"),
        Some(&json!({"port": 9000, "open": true})),
        "custom port should override while unrelated keys survive"
    );

    let dev = hierarchical.mode_config(BuildMode::Dev).expect("dev section should parse");
    assert_eq!(dev.app_entrys, json!(true));
    assert_eq!(dev.entrys_inquirer, EntrysInquirer::Threshold(5));

    let hooks = hierarchical.git_hooks().expect("gitHooks section should parse");
    assert_eq!(hooks.level, LevelRef::Number(3));
    assert_eq!(hooks.reject_modifi, vec!["**/vendor/**".to_string()]);
    assert!(!hooks.allow_notify);
    assert!(hooks.use_eslint, "unset keys keep their defaults");
}

#[test]
fn integration_custom_file_redirected_by_default_config() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    create_temp_config_file(
        temp_dir.path(),
        "scaffold.config.toml",
        r#"
customConfigFilePath = "local/mine.toml"

[prod]
devtool = "none"
"#,
    );
    // Ignored: the redirect wins over the conventional name.
    create_temp_config_file(
        temp_dir.path(),
        "scaffold.custom.config.toml",
        r#"
[prod]
devtool = "eval"
"#,
    );
    let redirected = create_temp_config_file(
        temp_dir.path(),
        "local/mine.toml",
        r#"
[prod]
publicPath = "https://cdn.example.com/"
"#,
    );

    let hierarchical = load_hierarchical_config(temp_dir.path(), None).expect("load should succeed");
    assert_eq!(hierarchical.sources.len(), 2);
    assert_eq!(hierarchical.sources[1].path, redirected);

    let prod = hierarchical.mode_config(BuildMode::Prod).expect("prod section should parse");
    assert_eq!(prod.devtool, "none");
    assert_eq!(prod.public_path, "https://cdn.example.com/");
}

#[test]
fn integration_explicit_config_replaces_default_file() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    create_temp_config_file(
        temp_dir.path(),
        "scaffold.config.toml",
        r#"
[gitHooks]
level = "master"
"#,
    );
    create_temp_config_file(
        temp_dir.path(),
        "ci/scaffold.ci.toml",
        r#"
[gitHooks]
enabled = false
"#,
    );

    let hierarchical = load_hierarchical_config(temp_dir.path(), Some(Path::new("ci/scaffold.ci.toml")))
        .expect("explicit config should load");
    assert_eq!(hierarchical.sources.len(), 1);
    assert_eq!(hierarchical.sources[0].source_type, ConfigSourceType::CliExplicit);

    let hooks = hierarchical.git_hooks().expect("gitHooks section should parse");
    assert!(!hooks.enabled);
    assert_eq!(hooks.level, LevelRef::default(), "the default file must not be read");

    let missing = load_hierarchical_config(temp_dir.path(), Some(Path::new("nope.toml")));
    assert!(missing.is_err(), "a missing explicit config is an error");
}

#[test]
fn integration_malformed_config_reports_path() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let path = create_temp_config_file(temp_dir.path(), "scaffold.config.toml", "[dev\nappEntrys = ");

    let err = load_hierarchical_config(temp_dir.path(), None).expect_err("malformed TOML must fail");
    assert!(
        err.to_string().contains(&path.display().to_string()),
        "error should name the file: {err}"
    );
}

#[test]
fn integration_project_root_inside_git_repository() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    if !init_git_repo(temp_dir.path()) {
        return;
    }
    let nested = temp_dir.path().join("packages/web/src");
    fs::create_dir_all(&nested).expect("Failed to create nested dir");

    // Canonicalize both paths to handle macOS /private symlinks
    let expected = temp_dir.path().canonicalize().expect("Failed to canonicalize temp dir");

    let git_root = find_git_repo_root(&nested)
        .expect("find_git_repo_root should succeed")
        .expect("should find git repository root");
    assert_eq!(git_root.canonicalize().expect("Failed to canonicalize git root"), expected);

    let root = find_project_root(&nested);
    assert_eq!(root.canonicalize().expect("Failed to canonicalize root"), expected);

    // A package.json marks its own directory as the project root.
    let package = temp_dir.path().join("packages/web");
    create_temp_config_file(&package, "package.json", "{}");
    assert_eq!(find_project_root(&package), package);
}

#[test]
fn integration_project_root_outside_git_repository() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let dir = temp_dir.path().join("plain");
    fs::create_dir_all(&dir).expect("Failed to create dir");

    // The temp dir may itself live in a repository; only assert the no-repo case.
    if find_git_repo_root(&dir).expect("discovery should not fail").is_none() {
        assert_eq!(find_project_root(&dir), dir);
    }
}
