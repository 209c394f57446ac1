//! Application entry discovery.
//!
//! Projects keep one directory per application under a base directory
//! (`src/module`, `src/modules` or `src/pages`), each holding a script whose
//! file name is part of the directory name:
//!
//! ```text
//! src/pages/
//! ├── home/home.js        -> entry "home"
//! ├── adminPanel/panel.ts -> entry "panel"
//! └── docs/helpers.js     -> ignored
//! ```
//!
//! [`EntryResolver::smart_entrys`] decides which of those entries to build
//! from the invocation flags, the configured filter and, when asked, an
//! interactive multi-select whose answer is remembered per build mode.

use crate::argv::{ALL_ENTRY_FLAGS, ArgvResolver, ENTRY_FLAGS, INQUIRE_FLAGS};
use crate::config::{BuildMode, EntrysInquirer};
use crate::error::Result;
use crate::file_utils::relative_slash;
use crate::filter::{EntryFilter, get_entrys_by_filter};
use crate::json_store::JsonStore;
use dialoguer::MultiSelect;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Entry name to source path relative to the project root.
pub type EntryMap = BTreeMap<String, String>;

/// Base directories probed, in order, when none is configured.
pub const DEFAULT_BASE_DIRS: &[&str] = &["src/module", "src/modules", "src/pages"];

/// Remembered interactive selections, relative to the project root.
pub const INQUIRE_LOG_FILE: &str = "log/inquireEntrys.json";

const ENTRY_EXTENSIONS: &[&str] = &["ts", "js"];

/// Asks the user which entries to use.
pub trait EntryPrompter {
    /// Returns the chosen subset of `choices`; `defaults` are pre-selected.
    ///
    /// # Errors
    ///
    /// Returns an error when the prompt cannot be shown or answered.
    fn select(&self, choices: &[String], defaults: &[String]) -> Result<Vec<String>>;
}

/// Terminal multi-select prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

impl EntryPrompter for TerminalPrompter {
    fn select(&self, choices: &[String], defaults: &[String]) -> Result<Vec<String>> {
        let checked: Vec<bool> = choices.iter().map(|c| defaults.contains(c)).collect();
        loop {
            let picked = MultiSelect::new()
                .with_prompt("Select application entries (space to toggle, enter to confirm)")
                .items(choices)
                .defaults(&checked)
                .interact()?;
            if !picked.is_empty() {
                return Ok(picked.into_iter().map(|i| choices[i].clone()).collect());
            }
            eprintln!("Select at least one entry.");
        }
    }
}

/// Options for [`EntryResolver::smart_entrys`].
#[derive(Debug, Clone)]
pub struct SmartEntryOptions {
    /// Filter used when no flag or prompt decides.
    pub filter: Option<EntryFilter>,
    /// Interactive selection policy.
    pub inquirer: EntrysInquirer,
    /// Persist the interactive answer and offer it as the default next time.
    pub remember: bool,
    /// Key under which the answer is remembered.
    pub mode: BuildMode,
}

impl Default for SmartEntryOptions {
    fn default() -> Self {
        Self {
            filter: None,
            inquirer: EntrysInquirer::default(),
            remember: true,
            mode: BuildMode::default(),
        }
    }
}

/// Discovers entries below a project root.
#[derive(Debug, Clone)]
pub struct EntryResolver {
    root: PathBuf,
    base_path: Option<PathBuf>,
}

impl EntryResolver {
    /// Resolver for `root`, probing [`DEFAULT_BASE_DIRS`].
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_path: None,
        }
    }

    /// Uses `base_path` (relative to the root) instead of probing.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// The project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn base_dir(&self) -> Option<PathBuf> {
        match &self.base_path {
            Some(base) => Some(base.clone()),
            None => DEFAULT_BASE_DIRS
                .iter()
                .map(PathBuf::from)
                .find(|dir| self.root.join(dir).is_dir()),
        }
    }

    /// Scans the base directory and applies `filter`.
    ///
    /// A file `<base>/<dir>/<name>.{ts,js}` is an entry when the lowercase
    /// `<dir>` contains the lowercase `<name>`. Later files win on a name
    /// collision. Missing directories and empty results are logged, never
    /// errors.
    #[tracing::instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    pub fn get_entrys(&self, filter: Option<&EntryFilter>) -> EntryMap {
        let mut entries = EntryMap::new();

        let Some(base) = self.base_dir().filter(|b| self.root.join(b).is_dir()) else {
            tracing::warn!(
                base = ?self.base_path,
                root = %self.root.display(),
                "No application directory found, cannot look up entries"
            );
            return entries;
        };

        let walker = WalkDir::new(self.root.join(&base))
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable path while scanning entries");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry_name(entry.path()) {
                entries.insert(name, relative_slash(entry.path(), &self.root));
            }
        }

        if entries.is_empty() {
            tracing::warn!(base = %base.display(), root = %self.root.display(), "No entries found");
        }

        let Some(filter) = filter else {
            return entries;
        };
        let filtered = get_entrys_by_filter(&entries, filter);
        if filtered.is_empty() && !entries.is_empty() {
            tracing::warn!(
                base = %base.display(),
                root = %self.root.display(),
                filter = %filter,
                "Filter matched no entries"
            );
        }
        filtered
    }

    /// Asks which entries to use, defaulting to the last answer for `mode`.
    ///
    /// # Errors
    ///
    /// Returns prompt failures and failures to persist the answer.
    pub fn inquire_entrys(
        &self,
        prompter: &dyn EntryPrompter,
        mode: BuildMode,
        remember: bool,
    ) -> Result<Vec<String>> {
        let log = remember.then(|| JsonStore::new(self.root.join(INQUIRE_LOG_FILE)));

        let defaults: Vec<String> = log
            .as_ref()
            .and_then(|l| l.read_node(mode.node_env()))
            .map(|v| string_list(&v))
            .unwrap_or_default();

        let choices: Vec<String> = self.get_entrys(None).into_keys().collect();
        if choices.is_empty() {
            return Ok(Vec::new());
        }

        let selected = prompter.select(&choices, &defaults)?;
        if let Some(log) = &log {
            log.write_node(mode.node_env(), Value::from(selected.clone()))?;
        }
        Ok(selected)
    }

    /// Resolves the entries to build.
    ///
    /// Precedence, highest first: an "all" flag, an explicit entry list flag,
    /// an interactive prompt (inquire flag or the configured policy), and
    /// finally `options.filter`. A bare entry flag without names selects
    /// nothing.
    ///
    /// # Errors
    ///
    /// Only the interactive step can fail.
    pub fn smart_entrys(
        &self,
        argv: &ArgvResolver,
        options: &SmartEntryOptions,
        prompter: &dyn EntryPrompter,
    ) -> Result<EntryMap> {
        let filter = if argv.get_arg_item_by_filter(ALL_ENTRY_FLAGS).is_some() {
            Some(EntryFilter::All)
        } else if let Some(names) = argv.get_arg_item_by_filter(ENTRY_FLAGS) {
            Some(EntryFilter::names(names.iter().cloned()))
        } else if argv.get_arg_item_by_filter(INQUIRE_FLAGS).is_some()
            || self.inquirer_wants_prompt(options.inquirer)
        {
            let selected = self.inquire_entrys(prompter, options.mode, options.remember)?;
            Some(EntryFilter::names(selected))
        } else {
            options.filter.clone()
        };

        Ok(self.get_entrys(filter.as_ref()))
    }

    fn inquirer_wants_prompt(&self, inquirer: EntrysInquirer) -> bool {
        match inquirer {
            EntrysInquirer::Enabled(enabled) => enabled,
            EntrysInquirer::Threshold(_) => inquirer.should_prompt(self.get_entrys(None).len()),
        }
    }
}

fn entry_name(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if !ENTRY_EXTENSIONS.contains(&ext) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let dir = path.parent()?.file_name()?.to_str()?;
    dir.to_lowercase()
        .contains(&stem.to_lowercase())
        .then(|| stem.to_string())
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
