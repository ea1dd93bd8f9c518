//! Nullable path resolution over JSON component data.
//!
//! A path is a sequence of segments. Object segments select keys, numeric
//! segments index arrays. Any missing step yields `None` instead of an error.

use std::borrow::Cow;

use serde_json::Value;

/// Walks `path` through a borrowed value.
#[must_use]
pub fn walk<'a, S: AsRef<str>>(value: &'a Value, path: &[S]) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        current = step(current, segment.as_ref())?;
    }
    Some(current)
}

/// Walks `path` through a value that may be borrowed or owned.
///
/// Borrowed inputs stay borrowed; owned inputs are cloned only at the end.
#[must_use]
pub fn walk_cow<'a, S: AsRef<str>>(value: Cow<'a, Value>, path: &[S]) -> Option<Cow<'a, Value>> {
    if path.is_empty() {
        return Some(value);
    }
    match value {
        Cow::Borrowed(v) => walk(v, path).map(Cow::Borrowed),
        Cow::Owned(v) => walk(&v, path).cloned().map(Cow::Owned),
    }
}

/// Takes a single step into a value.
#[must_use]
pub fn step<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Splits a dotted path into segments.
///
/// Component ids contain `:` but never `.`, so `entity.components.core:name.text`
/// splits into four segments. An empty string yields no segments.
#[must_use]
pub fn split(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split('.').map(str::to_string).collect()
}

/// Returns true if a path segment names a namespaced component (`ns:name`).
#[must_use]
pub fn is_component_id(segment: &str) -> bool {
    segment
        .split_once(':')
        .is_some_and(|(ns, name)| !ns.is_empty() && !name.is_empty())
}
