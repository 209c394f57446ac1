//! Recursive merge of configuration trees.
//!
//! Configuration trees are plain [`serde_json::Value`] documents regardless of
//! whether they were read from TOML, JSON or YAML. The merge rules are:
//!
//! - keys only present in the override are adopted as-is
//! - two mappings at the same path are merged recursively
//! - two sequences at the same path are replaced by the override, or
//!   concatenated (base first) when [`ArrayMerge::Concat`] is requested
//! - anything else is overwritten by the override
//!
//! Both functions are pure: inputs are borrowed and a new tree is returned, so
//! the same default tree can be merged against several overrides.

use serde_json::{Map, Value};

/// How two sequences found at the same path are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayMerge {
    /// The override's sequence replaces the base sequence.
    #[default]
    Replace,
    /// The override's sequence is appended to the base sequence.
    Concat,
}

/// Merges `override_` into `base` and returns the combined tree.
///
/// When either root is not a mapping, `base` is returned unchanged: only
/// mapping-typed roots are merged.
///
/// # Examples
///
/// ```
/// use scaffold_core::deep_merge::{merge_obj, ArrayMerge};
/// use serde_json::json;
///
/// let merged = merge_obj(&json!({"a": [1, 2]}), &json!({"a": [3]}), ArrayMerge::Concat);
/// assert_eq!(merged, json!({"a": [1, 2, 3]}));
/// ```
#[must_use]
pub fn merge_obj(base: &Value, override_: &Value, arrays: ArrayMerge) -> Value {
    match (base, override_) {
        (Value::Object(a), Value::Object(b)) => Value::Object(merge_maps(a, b, arrays)),
        _ => base.clone(),
    }
}

fn merge_maps(a: &Map<String, Value>, b: &Map<String, Value>, arrays: ArrayMerge) -> Map<String, Value> {
    let mut result = a.clone();
    for (key, b_val) in b {
        let merged = match (result.get(key), b_val) {
            (Some(Value::Object(a_map)), Value::Object(b_map)) => {
                Value::Object(merge_maps(a_map, b_map, arrays))
            }
            (Some(Value::Array(a_arr)), Value::Array(b_arr)) if arrays == ArrayMerge::Concat => {
                Value::Array(a_arr.iter().chain(b_arr).cloned().collect())
            }
            _ => b_val.clone(),
        };
        result.insert(key.clone(), merged);
    }
    result
}

/// Folds several trees left to right with [`ArrayMerge::Replace`].
///
/// Later trees take precedence. An empty slice yields [`Value::Null`].
#[must_use]
pub fn merge(configs: &[Value]) -> Value {
    let mut iter = configs.iter();
    let Some(first) = iter.next() else {
        return Value::Null;
    };
    iter.fold(first.clone(), |acc, next| {
        merge_obj(&acc, next, ArrayMerge::Replace)
    })
}

/// Looks up a nested value by a dotted path such as `dev.webpackConfig.devServer`.
///
/// An empty path returns the whole tree. Returns `None` as soon as a segment is
/// missing or an intermediate value is not a mapping.
#[must_use]
pub fn value_at_path<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(tree);
    }
    path.split('.')
        .try_fold(tree, |node, segment| node.as_object()?.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_obj_replaces_arrays_by_default() {
        let merged = merge_obj(&json!({"a": [1, 2]}), &json!({"a": [3]}), ArrayMerge::Replace);
        assert_eq!(merged, json!({"a": [3]}));
    }

    #[test]
    fn test_merge_obj_concatenates_arrays_when_requested() {
        let merged = merge_obj(&json!({"a": [1, 2]}), &json!({"a": [3]}), ArrayMerge::Concat);
        assert_eq!(merged, json!({"a": [1, 2, 3]}));
    }

    #[test]
    fn test_merge_obj_recurses_into_nested_maps() {
        let base = json!({"gitHooks": {"level": "beginner", "useEslint": true}});
        let custom = json!({"gitHooks": {"level": "master"}});
        let merged = merge_obj(&base, &custom, ArrayMerge::Replace);
        assert_eq!(
            merged,
            json!({"gitHooks": {"level": "master", "useEslint": true}})
        );
    }

    #[test]
    fn test_merge_obj_shape_change_overwrites() {
        let base = json!({"appEntrys": {"nested": true}, "port": 8088});
        let custom = json!({"appEntrys": true, "port": {"http": 80}});
        let merged = merge_obj(&base, &custom, ArrayMerge::Concat);
        assert_eq!(merged, json!({"appEntrys": true, "port": {"http": 80}}));
    }

    #[test]
    fn test_merge_obj_non_mapping_root_returns_base() {
        assert_eq!(merge_obj(&json!([1]), &json!({"a": 1}), ArrayMerge::Replace), json!([1]));
        assert_eq!(merge_obj(&json!({"a": 1}), &json!(3), ArrayMerge::Replace), json!({"a": 1}));
    }

    #[test]
    fn test_merge_obj_does_not_mutate_inputs() {
        let base = json!({"a": {"b": 1}});
        let custom = json!({"a": {"c": 2}});
        let _ = merge_obj(&base, &custom, ArrayMerge::Replace);
        assert_eq!(base, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_merge_folds_left_to_right() {
        let a = json!({"x": 1, "y": 1});
        let b = json!({"x": 2});
        let c = json!({"x": 3, "z": 3});
        assert_eq!(merge(&[a, b, c]), json!({"x": 3, "y": 1, "z": 3}));
    }

    #[test]
    fn test_merge_of_nothing_is_null() {
        assert_eq!(merge(&[]), Value::Null);
    }

    #[test]
    fn test_value_at_path_walks_nested_maps() {
        let tree = json!({"dev": {"webpackConfig": {"devServer": {"port": "8088"}}}});
        assert_eq!(
            value_at_path(&tree, "dev.webpackConfig.devServer.port"),
            Some(&json!("8088"))
        );
        assert_eq!(value_at_path(&tree, ""), Some(&tree));
        assert_eq!(value_at_path(&tree, "dev.missing"), None);
        assert_eq!(value_at_path(&tree, "dev.webpackConfig.devServer.port.deeper"), None);
    }
}
