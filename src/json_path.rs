//! Dotted-path array extraction over parsed JSON.
//!
//! `extract(root, Some("data.items"))` walks object fields `data` then `items`
//! and returns the elements if the target is an array. Anything else (no path,
//! non-object on the way, missing field, non-array target) is `None`, which the
//! assembler treats as "return the whole document".

use serde_json::Value;

/// Split a dotted path into non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

/// Resolve `path` against `root` without requiring an array at the end.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments(path) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Array(_) => return None,
        };
    }
    Some(current)
}

/// Locate the array at `path`. Blank or missing path yields `None`.
pub fn extract(root: &Value, path: Option<&str>) -> Option<Vec<Value>> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    match resolve(root, path)? {
        Value::Array(items) => Some(items.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_path_means_no_array() {
        assert_eq!(extract(&json!([1, 2]), None), None);
        assert_eq!(extract(&json!({"a": [1]}), Some("")), None);
        assert_eq!(extract(&json!({"a": [1]}), Some("   ")), None);
    }

    #[test]
    fn nested_path_resolves_array() {
        let root = json!({"a": {"b": [1, 2]}});
        assert_eq!(extract(&root, Some("a.b")), Some(vec![json!(1), json!(2)]));
    }

    #[test]
    fn non_object_on_the_way_is_a_miss() {
        assert_eq!(extract(&json!({"a": 1}), Some("a.b")), None);
        assert_eq!(extract(&json!({"a": [{"b": [1]}]}), Some("a.b")), None);
    }

    #[test]
    fn missing_field_or_non_array_target_is_a_miss() {
        let root = json!({"a": {"b": "text"}});
        assert_eq!(extract(&root, Some("a.c")), None);
        assert_eq!(extract(&root, Some("a.b")), None);
    }

    #[test]
    fn empty_segments_are_ignored() {
        let root = json!({"a": {"b": [true]}});
        assert_eq!(extract(&root, Some(".a..b.")), Some(vec![json!(true)]));
    }

    #[test]
    fn dots_only_resolve_to_root_array() {
        assert_eq!(extract(&json!([1]), Some("..")), Some(vec![json!(1)]));
    }
}
