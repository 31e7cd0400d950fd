//! Document Tree Visitor
//!
//! Walks a JSON document along a field path such as `settings.files.value`.
//! Sequences met along the way are entered element by element, so a single
//! path can address a field in every entry of a playlist.
//!
//! The callback receives the containing mapping and the matching key instead
//! of the value itself, which lets the mutating variant rewrite fields in place.

use serde_json::{Map, Value};

/// Splits a dotted field path (`"settings.local_file"`) into its steps.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('.').filter(|step| !step.is_empty()).collect()
}

/// Calls `callback(container, key)` for every field matching `pattern` below `node`.
///
/// Missing keys, scalar nodes and an empty pattern end the walk for that branch
/// without error. Callbacks fire in document order.
pub fn visit<'a, F>(node: &'a Value, pattern: &[&str], callback: &mut F)
where
    F: FnMut(&'a Map<String, Value>, &str),
{
    match node {
        Value::Array(items) => {
            for item in items {
                visit(item, pattern, callback);
            }
        }
        Value::Object(map) => match pattern {
            [] => {}
            [key] => {
                if map.contains_key(*key) {
                    callback(map, *key);
                }
            }
            [key, rest @ ..] => {
                if let Some(child) = map.get(*key) {
                    visit(child, rest, callback);
                }
            }
        },
        _ => {}
    }
}

/// Mutable counterpart of [`visit`]; the callback may overwrite `container[key]`.
pub fn visit_mut<F>(node: &mut Value, pattern: &[&str], callback: &mut F)
where
    F: FnMut(&mut Map<String, Value>, &str),
{
    match node {
        Value::Array(items) => {
            for item in items.iter_mut() {
                visit_mut(item, pattern, callback);
            }
        }
        Value::Object(map) => match pattern {
            [] => {}
            [key] => {
                if map.contains_key(*key) {
                    callback(map, *key);
                }
            }
            [key, rest @ ..] => {
                if let Some(child) = map.get_mut(*key) {
                    visit_mut(child, rest, callback);
                }
            }
        },
        _ => {}
    }
}
