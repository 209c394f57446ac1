//! Build orchestration.
//!
//! The scaffold does not bundle anything itself. It resolves what to build
//! into a [`BuildPlan`], writes the plan as JSON, hands it to the configured
//! bundler command and post-processes the output:
//!
//! 1. resolve entries ([`EntryResolver::smart_entrys`]) and the mode config,
//! 2. stamp the build with a version tag,
//! 3. run `bundler... <plan.json>` from the project root,
//! 4. inject the runtime tooling into every emitted HTML page,
//! 5. for production builds, write `appStatus.json` next to the assets.

use crate::argv::{ArgvResolver, NO_CACHE_FLAGS, TMP_DIR_FLAGS};
use crate::config::{BuildMode, ModeConfig};
use crate::config_hierarchy::HierarchicalConfig;
use crate::entry::{EntryMap, EntryPrompter, EntryResolver, SmartEntryOptions};
use crate::error::{Result, ScaffoldError};
use crate::filter::EntryFilter;
use crate::inject::{DEFAULT_GUARD_SRC, inject_debug_tooling, with_cache_buster};
use crate::json_store::JsonStore;
use crate::version::VersionLog;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::instrument;
use walkdir::WalkDir;

/// Plan location relative to the project root.
pub const PLAN_FILE: &str = "log/buildPlan.json";

/// Parent of the throwaway output directories used with the `tmp` flag.
pub const TMP_OUTPUT_DIR: &str = "dist/.tempDir";

/// Version id shared by every step of one build.
pub const BUILD_VERSION_ID: &str = "buildVer";

const APP_STATUS_FILE: &str = "appStatus";

/// Bundler cache setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CacheDirective {
    /// Persistent cache on disk.
    Filesystem,
    /// In-memory cache only.
    Memory,
}

/// Everything the bundler needs to know about one build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPlan {
    /// `development`, `production` or `test`.
    pub mode: String,
    /// Project root.
    pub root: PathBuf,
    /// Entry name to root-relative source path.
    pub entries: EntryMap,
    /// Absolute output directory.
    pub output_dir: PathBuf,
    /// Public URL prefix of emitted assets.
    pub public_path: String,
    /// Asset directory inside the output directory.
    pub assets_dir: String,
    /// Source map style.
    pub devtool: String,
    /// Cache setting.
    pub cache: CacheDirective,
    /// Minify emitted HTML.
    pub minify_html_template: bool,
    /// Inject the runtime tooling into emitted HTML.
    pub inject_debug_tools: bool,
    /// Extra bundler configuration, passed through untouched.
    pub webpack_config: Value,
    /// Build version tag.
    pub version: String,
}

impl BuildPlan {
    /// Assembles a plan from resolved parts.
    ///
    /// The `tmp` flags redirect output to `dist/.tempDir/<now_millis>`; the
    /// no-cache flags turn the filesystem cache off.
    #[must_use]
    pub fn assemble(
        root: &Path,
        mode: BuildMode,
        config: &ModeConfig,
        entries: EntryMap,
        argv: &ArgvResolver,
        version: String,
        now_millis: i64,
    ) -> Self {
        let output_dir = if argv.get_arg_item_by_filter(TMP_DIR_FLAGS).is_some() {
            root.join(TMP_OUTPUT_DIR).join(now_millis.to_string())
        } else {
            config.output_dir_in(root)
        };
        let no_cache = argv.get_arg_item_by_filter(NO_CACHE_FLAGS).is_some();
        let cache = if config.use_filesystem_cache && !no_cache {
            CacheDirective::Filesystem
        } else {
            CacheDirective::Memory
        };

        Self {
            mode: mode.node_env().to_string(),
            root: root.to_path_buf(),
            entries,
            output_dir,
            public_path: config.public_path.clone(),
            assets_dir: config.assets_dir.clone(),
            devtool: config.devtool.clone(),
            cache,
            minify_html_template: config.minify_html_template,
            inject_debug_tools: config.inject_debug_tools,
            webpack_config: config.webpack_config.clone(),
            version,
        }
    }

    /// Directory holding `appStatus.json`.
    #[must_use]
    pub fn status_dir(&self) -> PathBuf {
        self.output_dir.join(&self.assets_dir).join("data")
    }
}

/// Drives one build of a project.
pub struct BuildPipeline<'a> {
    config: &'a HierarchicalConfig,
    mode: BuildMode,
    argv: &'a ArgvResolver,
}

impl<'a> BuildPipeline<'a> {
    /// Creates a pipeline for `mode`.
    pub const fn new(config: &'a HierarchicalConfig, mode: BuildMode, argv: &'a ArgvResolver) -> Self {
        Self { config, mode, argv }
    }

    fn root(&self) -> &Path {
        &self.config.root
    }

    /// Resolves entries and settings into a plan.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid mode section, a failed entry prompt,
    /// an unwritable version log, or when no entry is selected.
    #[instrument(skip_all, fields(mode = %self.mode), level = "debug")]
    pub fn prepare(&self, prompter: &dyn EntryPrompter) -> Result<BuildPlan> {
        let mode_config = self.config.mode_config(self.mode)?;
        let options = SmartEntryOptions {
            filter: EntryFilter::from_config(&mode_config.app_entrys),
            inquirer: mode_config.entrys_inquirer,
            remember: true,
            mode: self.mode,
        };
        let entries = EntryResolver::new(self.root()).smart_entrys(self.argv, &options, prompter)?;
        if entries.is_empty() {
            return Err(ScaffoldError::invalid_input("no entries selected, nothing to build"));
        }

        let version = VersionLog::new(self.root()).create_tag(Some(BUILD_VERSION_ID))?;
        Ok(BuildPlan::assemble(
            self.root(),
            self.mode,
            &mode_config,
            entries,
            self.argv,
            version,
            Utc::now().timestamp_millis(),
        ))
    }

    /// Writes the plan, runs the bundler and post-processes its output.
    ///
    /// Returns whether the build succeeded. Without a configured bundler
    /// only the plan is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan cannot be written, the bundler cannot be
    /// started, or the output cannot be post-processed.
    #[instrument(skip_all, fields(mode = %plan.mode), level = "debug")]
    pub fn execute(&self, plan: &BuildPlan) -> Result<bool> {
        let plan_path = self.root().join(PLAN_FILE);
        JsonStore::new(&plan_path).write(&serde_json::to_value(plan)?)?;
        tracing::info!(path = %plan_path.display(), entries = plan.entries.len(), "Build plan written");

        let bundler = self.config.mode_config(self.mode)?.bundler;
        let Some((program, args)) = bundler.split_first() else {
            tracing::warn!(section = self.mode.section(), "No bundler configured, only the plan was written");
            return Ok(true);
        };

        let status = Command::new(program)
            .args(args)
            .arg(&plan_path)
            .current_dir(self.root())
            .status()
            .map_err(|e| ScaffoldError::io_error_with_source(format!("start bundler `{program}`"), plan_path.clone(), e))?;
        if !status.success() {
            tracing::error!(code = ?status.code(), "Bundler failed");
            return Ok(false);
        }

        if plan.inject_debug_tools {
            inject_output_templates(plan, self.mode)?;
        }
        if self.mode == BuildMode::Prod {
            write_app_status(plan)?;
        }
        Ok(true)
    }
}

/// Injects the runtime tooling into every `.html` file under the output
/// directory.
///
/// # Errors
///
/// Returns an error if a page cannot be read or written.
pub fn inject_output_templates(plan: &BuildPlan, mode: BuildMode) -> Result<usize> {
    if !plan.output_dir.is_dir() {
        return Ok(0);
    }
    let guard = with_cache_buster(DEFAULT_GUARD_SRC, Utc::now().timestamp_millis());
    let status_dir = plan.status_dir();
    let mut count = 0;

    for entry in WalkDir::new(&plan.output_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().is_none_or(|ext| ext != "html")
            || path.starts_with(&status_dir)
        {
            continue;
        }
        let html = fs::read_to_string(path)
            .map_err(|e| ScaffoldError::io_error_with_source("read HTML page", path.to_path_buf(), e))?;
        let injected = inject_debug_tooling(&html, mode, &plan.version, Some(&guard));
        fs::write(path, injected)
            .map_err(|e| ScaffoldError::io_error_with_source("write HTML page", path.to_path_buf(), e))?;
        count += 1;
    }
    tracing::debug!(pages = count, "Injected runtime tooling");
    Ok(count)
}

/// Writes `appStatus.json` and its `.html` twin with the build version, so
/// deployed pages can detect a new release.
///
/// # Errors
///
/// Returns an error if either file cannot be written.
pub fn write_app_status(plan: &BuildPlan) -> Result<()> {
    let status = json!({
        "lastVersion": plan.version,
        "isClearHtmlCache": true,
    });
    let dir = plan.status_dir();
    JsonStore::new(dir.join(format!("{APP_STATUS_FILE}.json"))).write(&status)?;
    JsonStore::new(dir.join(format!("{APP_STATUS_FILE}.html"))).write(&status)?;
    Ok(())
}
