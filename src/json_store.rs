//! Small JSON documents persisted on disk.
//!
//! The scaffold keeps a handful of JSON logs next to the project: remembered
//! entry selections, the git-hook audit log, the lint report and the version
//! history. Each is read and written as a whole document per operation, so
//! concurrent writers from separate processes are not synchronised and the
//! last writer wins.
//!
//! Nested values are addressed with dotted node paths (`"a.b.c"`).

use crate::error::{Result, ScaffoldError};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// A JSON document stored at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Creates a store for `path`. Nothing is touched on disk until a write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the whole document.
    ///
    /// A missing file or a file that does not hold valid JSON reads as `{}`.
    #[must_use]
    pub fn read(&self) -> Value {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Value::Object(Map::new());
        };
        match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable JSON document");
                Value::Object(Map::new())
            }
        }
    }

    /// Replaces the whole document, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write(&self, doc: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                ScaffoldError::io_error_with_source(
                    "create log directory",
                    parent.to_path_buf(),
                    e,
                )
            })?;
        }
        let body = serde_json::to_string_pretty(doc)?;
        fs::write(&self.path, body).map_err(|e| {
            ScaffoldError::io_error_with_source("write JSON document", self.path.clone(), e)
        })
    }

    /// Reads the value stored at `node_path`.
    #[must_use]
    pub fn read_node(&self, node_path: &str) -> Option<Value> {
        get_node(&self.read(), node_path).cloned()
    }

    /// Stores `data` at `node_path`, re-reading and rewriting the document.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty node path or when the write fails.
    pub fn write_node(&self, node_path: &str, data: Value) -> Result<()> {
        if node_path.is_empty() {
            return Err(ScaffoldError::invalid_input(
                "a node path is required to write into a JSON document",
            ));
        }
        let mut doc = self.read();
        set_node(&mut doc, node_path, data);
        self.write(&doc)
    }
}

/// Returns the value at `node_path`, or the document itself for an empty path.
#[must_use]
pub fn get_node<'a>(doc: &'a Value, node_path: &str) -> Option<&'a Value> {
    crate::deep_merge::value_at_path(doc, node_path)
}

/// Writes `data` at `node_path`, turning every non-object intermediate node
/// (and a non-object root) into an empty object first.
pub fn set_node(doc: &mut Value, node_path: &str, data: Value) {
    let mut segments: Vec<&str> = node_path.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };

    let mut node = doc;
    for segment in segments {
        node = ensure_object(node)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node).insert(last.to_string(), data);
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}
