//! Entry selection predicates.
//!
//! An [`EntryFilter`] decides which discovered entries are kept. It is either
//! "everything", a single predicate (exact name, regular expression or
//! closure), or an ordered list of filters combined with OR semantics.

use regex_lite::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Closure predicate over `(entry name, entry path)`.
pub type EntryPredicate = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// A filter over an entry map.
#[derive(Clone)]
pub enum EntryFilter {
    /// Keep every entry.
    All,
    /// Keep the entry whose name equals the string.
    Exact(String),
    /// Keep entries whose name matches the expression.
    Pattern(Regex),
    /// Keep entries for which the closure returns `true`.
    Predicate(EntryPredicate),
    /// Keep entries matched by any of the filters.
    AnyOf(Vec<EntryFilter>),
}

impl fmt::Debug for EntryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Exact(name) => f.debug_tuple("Exact").field(name).finish(),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Self::Predicate(_) => write!(f, "Predicate(<fn>)"),
            Self::AnyOf(items) => f.debug_tuple("AnyOf").field(items).finish(),
        }
    }
}

impl fmt::Display for EntryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "true"),
            Self::Exact(name) => write!(f, "{name}"),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
            Self::Predicate(_) => write!(f, "<fn>"),
            Self::AnyOf(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

impl EntryFilter {
    /// Builds an OR-list of exact names.
    #[must_use]
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyOf(names.into_iter().map(|n| Self::Exact(n.into())).collect())
    }

    /// Wraps a closure predicate.
    #[must_use]
    pub fn predicate(f: impl Fn(&str, &str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Whether the entry `name` (with source `path`) is retained.
    #[must_use]
    pub fn matches(&self, name: &str, path: &str) -> bool {
        match self {
            Self::All => true,
            Self::Exact(expected) => expected == name,
            Self::Pattern(re) => re.is_match(name),
            Self::Predicate(f) => f(name, path),
            Self::AnyOf(items) => items.iter().any(|item| item.matches(name, path)),
        }
    }

    /// Interprets an `appEntrys` configuration value.
    ///
    /// - `true` selects every entry, `false`/`null` means "no filter"
    /// - a string is an exact name, or a regular expression when written as
    ///   `/pattern/`
    /// - `{ regex = "pattern" }` is a regular expression
    /// - an array is an OR-list of the above
    ///
    /// Values that cannot be interpreted are logged and skipped.
    #[must_use]
    pub fn from_config(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(true) => Some(Self::All),
            Value::Bool(false) | Value::Null => None,
            Value::String(s) => parse_string_rule(s),
            Value::Array(items) => Some(Self::AnyOf(
                items.iter().filter_map(Self::from_config).collect(),
            )),
            Value::Object(map) => match map.get("regex").and_then(Value::as_str) {
                Some(pattern) => compile(pattern),
                None => {
                    tracing::warn!(value = %value, "Unsupported appEntrys object, expected {{ regex = \"...\" }}");
                    None
                }
            },
            Value::Number(_) => {
                tracing::warn!(value = %value, "Unsupported appEntrys value, ignoring");
                None
            }
        }
    }
}

fn parse_string_rule(s: &str) -> Option<EntryFilter> {
    if s.len() >= 2 && s.starts_with('/') && s.ends_with('/') {
        compile(&s[1..s.len() - 1])
    } else {
        Some(EntryFilter::Exact(s.to_string()))
    }
}

fn compile(pattern: &str) -> Option<EntryFilter> {
    match Regex::new(pattern) {
        Ok(re) => Some(EntryFilter::Pattern(re)),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Invalid entry pattern, ignoring");
            None
        }
    }
}

/// Keeps the entries of `entries` accepted by `filter`.
#[must_use]
pub fn get_entrys_by_filter(
    entries: &BTreeMap<String, String>,
    filter: &EntryFilter,
) -> BTreeMap<String, String> {
    if matches!(filter, EntryFilter::All) {
        return entries.clone();
    }
    entries
        .iter()
        .filter(|(name, path)| filter.matches(name, path))
        .map(|(name, path)| (name.clone(), path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> BTreeMap<String, String> {
        ["foo", "bar", "baz"]
            .iter()
            .map(|n| (n.to_string(), format!("src/pages/{n}/{n}.js")))
            .collect()
    }

    fn keys(map: &BTreeMap<String, String>) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_exact_and_pattern_combine_with_or() {
        let filter = EntryFilter::AnyOf(vec![
            EntryFilter::Exact("foo".into()),
            EntryFilter::Pattern(Regex::new("^ba").unwrap()),
        ]);
        assert_eq!(keys(&get_entrys_by_filter(&sample(), &filter)), ["bar", "baz", "foo"]);
    }

    #[test]
    fn test_predicate_sees_name_and_path() {
        let filter = EntryFilter::predicate(|name, path| name == "baz" && path.ends_with("baz.js"));
        assert_eq!(keys(&get_entrys_by_filter(&sample(), &filter)), ["baz"]);
    }

    #[test]
    fn test_all_keeps_everything() {
        assert_eq!(get_entrys_by_filter(&sample(), &EntryFilter::All), sample());
    }

    #[test]
    fn test_empty_any_of_keeps_nothing() {
        assert!(get_entrys_by_filter(&sample(), &EntryFilter::AnyOf(vec![])).is_empty());
    }

    #[test]
    fn test_from_config_interprets_values() {
        assert!(matches!(EntryFilter::from_config(&json!(true)), Some(EntryFilter::All)));
        assert!(EntryFilter::from_config(&json!(false)).is_none());
        assert!(EntryFilter::from_config(&Value::Null).is_none());

        let filter = EntryFilter::from_config(&json!(["foo", "/^ba/", {"regex": "z$"}])).unwrap();
        assert_eq!(keys(&get_entrys_by_filter(&sample(), &filter)), ["bar", "baz", "foo"]);
    }

    #[test]
    fn test_from_config_skips_invalid_patterns() {
        let filter = EntryFilter::from_config(&json!(["foo", "/(/", 3])).unwrap();
        assert_eq!(keys(&get_entrys_by_filter(&sample(), &filter)), ["foo"]);
    }

    #[test]
    fn test_display_lists_rules() {
        let filter = EntryFilter::from_config(&json!(["foo", "/^ba/"])).unwrap();
        assert_eq!(filter.to_string(), "foo,/^ba/");
    }
}
