//! Deep-merge mechanics for configuration values.

use serde_json::{Map, Value};

/// Overlay `layer` onto `target`, updating `target` in place.
///
/// Behaviour:
/// - Objects merge recursively: keys are added or overwritten, and nested
///   objects are overlaid rather than replaced.
/// - Arrays and scalars replace `target` wholesale; arrays are never
///   concatenated or merged element-wise.
/// - Merging an object into a non-object target resets the target to `{}`
///   first.
///
/// Depth is bounded only by the input. Every mapping written into `target`
/// is an independently owned [`Map`]; no shared state is merged into.
///
/// # Examples
///
/// ```rust
/// use cascade_config::merge_value;
/// use serde_json::json;
///
/// let mut acc = json!({"a": 1, "b": {"x": 1}});
/// merge_value(&mut acc, json!({"b": {"y": 2}, "c": 3}));
/// assert_eq!(acc, json!({"a": 1, "b": {"x": 1, "y": 2}, "c": 3}));
///
/// // Arrays replace existing values.
/// merge_value(&mut acc, json!({"b": [1, 2, 3]}));
/// assert_eq!(acc["b"], json!([1, 2, 3]));
/// ```
pub fn merge_value(target: &mut Value, layer: Value) {
    match layer {
        Value::Object(map) => merge_object(target, map),
        _ => *target = layer,
    }
}

/// Deep-merge `fragment` into `target` under `key`.
///
/// The key is created when absent; when it already holds a mapping, the
/// fragment is overlaid into it per [`merge_value`]. This is the keying rule
/// for named source files: `logging.toml` merges under `logging`.
///
/// # Examples
///
/// ```rust
/// use cascade_config::merge_under_key;
/// use serde_json::json;
///
/// let mut acc = json!({"database": {"host": "localhost"}});
/// merge_under_key(&mut acc, "database", json!({"port": "5432"}));
/// assert_eq!(acc["database"], json!({"host": "localhost", "port": "5432"}));
/// ```
pub fn merge_under_key(target: &mut Value, key: &str, fragment: Value) {
    let mut wrapper = Map::new();
    wrapper.insert(key.to_owned(), fragment);
    merge_object(target, wrapper);
}

fn merge_object(target: &mut Value, map: Map<String, Value>) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }

    let Some(target_map) = target.as_object_mut() else {
        return;
    };

    for (key, value) in map {
        match target_map.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target_map.insert(key, value);
            }
        }
    }
}
