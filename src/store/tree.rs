use serde_json::{Map, Value};

use crate::error::StoreError;

const FORBIDDEN: &[char] = &['.', '#', '$', '[', ']'];

/// Splits `rooms/abc/questions` into segments. Empty segments (leading,
/// trailing or doubled slashes) are ignored.
pub fn parse_path(path: &str) -> Result<Vec<String>, StoreError> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if segment.contains(FORBIDDEN) || segment.chars().any(char::is_control) {
                Err(StoreError::InvalidPath(path.to_owned()))
            } else {
                Ok(segment.to_owned())
            }
        })
        .collect()
}

pub fn join(segments: &[String]) -> String {
    segments.join("/")
}

/// True when a write at `written` can change the value observed at `watched`.
pub fn overlaps(watched: &[String], written: &[String]) -> bool {
    watched.iter().zip(written).all(|(a, b)| a == b)
}

pub fn get_at(root: &Value, segments: &[String]) -> Value {
    let mut node = root;
    for segment in segments {
        match node.get(segment) {
            Some(child) => node = child,
            None => return Value::Null,
        }
    }
    node.clone()
}

/// Writes `value` at `segments`. Null deletes; objects left empty are pruned.
pub fn set_at(root: &mut Value, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };

    if value.is_null() {
        remove_at(root, parents, last);
        return;
    }

    let mut node = root;
    for segment in parents {
        node = as_object(node)
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    as_object(node).insert(last.clone(), value);
}

fn remove_at(node: &mut Value, parents: &[String], last: &str) {
    let Some(map) = node.as_object_mut() else {
        return;
    };
    match parents.split_first() {
        None => {
            map.remove(last);
        }
        Some((head, rest)) => {
            if let Some(child) = map.get_mut(head) {
                remove_at(child, rest, last);
                if child.is_null() {
                    map.remove(head);
                }
            }
        }
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}

fn as_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}
