//! Build version tags.
//!
//! Every build is stamped with its local start time. Tags are appended to the
//! `versions` array of `log/version.log.json`, which keeps the most recent
//! [`MAX_VERSIONS`] entries.

use crate::error::Result;
use crate::json_store::JsonStore;
use chrono::{DateTime, Local};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

/// Version log location relative to the project root.
pub const VERSION_LOG_FILE: &str = "log/version.log.json";

/// Number of tags kept in the log.
pub const MAX_VERSIONS: usize = 500;

const VERSION_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const VERSIONS_NODE: &str = "versions";

/// Creates and looks up build version tags.
///
/// Tags created with an id are cached for the lifetime of the value, so the
/// several steps of one build share one tag.
#[derive(Debug)]
pub struct VersionLog {
    store: JsonStore,
    by_id: RefCell<HashMap<String, String>>,
}

impl VersionLog {
    /// Opens the version log of the project at `root`.
    pub fn new(root: &Path) -> Self {
        Self::at(root.join(VERSION_LOG_FILE))
    }

    /// Opens a version log stored at `path`.
    pub fn at(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
            by_id: RefCell::new(HashMap::new()),
        }
    }

    /// Logged tags, oldest first. A `versions` node that is not an array
    /// reads as empty.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        match self.store.read_node(VERSIONS_NODE) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The tag cached for `id`, else the most recently logged tag.
    #[must_use]
    pub fn last_version(&self, id: Option<&str>) -> Option<String> {
        if let Some(tag) = id.and_then(|id| self.by_id.borrow().get(id).cloned()) {
            return Some(tag);
        }
        self.history().pop()
    }

    /// Creates a tag for the current local time and logs it.
    ///
    /// With an `id` already seen by this log, the cached tag is returned and
    /// nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub fn create_tag(&self, id: Option<&str>) -> Result<String> {
        self.create_tag_at(id, Local::now())
    }

    /// Like [`create_tag`](Self::create_tag) for a given time.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub fn create_tag_at(&self, id: Option<&str>, time: DateTime<Local>) -> Result<String> {
        if let Some(tag) = id.and_then(|id| self.by_id.borrow().get(id).cloned()) {
            return Ok(tag);
        }

        let tag = time.format(VERSION_FORMAT).to_string();
        let mut versions = self.history();
        versions.push(tag.clone());
        if versions.len() > MAX_VERSIONS {
            let excess = versions.len() - MAX_VERSIONS;
            versions.drain(..excess);
        }
        self.store.write_node(VERSIONS_NODE, json!(versions))?;
        tracing::debug!(tag = %tag, "Created build version");

        if let Some(id) = id {
            self.by_id.borrow_mut().insert(id.to_string(), tag.clone());
        }
        Ok(tag)
    }
}
