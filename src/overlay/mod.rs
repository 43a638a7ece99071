//! Structural merge and diff over document fragments
//!
//! A fragment is any subtree of a configuration document. Merge and diff
//! both descend only into maps:
//! - Maps: combined key by key (recursive)
//! - Lists: atomic, replaced wholesale
//! - Scalars and null: atomic, override wins

mod diff;
mod merge;

pub use diff::diff;
pub use merge::{merge, merge_layers};

use serde_json::Value;

/// A document subtree. `serde_json::Value` is the tagged union
/// {Object, Array, String, Number, Bool, Null}.
pub type Fragment = Value;

/// Shape of a fragment as seen by merge and diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Map,
    List,
    Scalar,
    Null,
}

impl FragmentKind {
    pub fn of(value: &Fragment) -> Self {
        match value {
            Value::Object(_) => FragmentKind::Map,
            Value::Array(_) => FragmentKind::List,
            Value::Null => FragmentKind::Null,
            Value::String(_) | Value::Number(_) | Value::Bool(_) => FragmentKind::Scalar,
        }
    }
}

/// Empty map fragment.
pub fn empty() -> Fragment {
    Value::Object(serde_json::Map::new())
}

/// Whether a fragment is an empty map.
pub fn is_empty_map(value: &Fragment) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}

/// Count terminal values, descending into maps and lists.
///
/// Empty maps and lists contribute nothing.
pub fn count_leaves(value: &Fragment) -> usize {
    match value {
        Value::Object(map) => map.values().map(count_leaves).sum(),
        Value::Array(items) => items.iter().map(count_leaves).sum(),
        _ => 1,
    }
}

/// Look up a value by dotted path. Map keys only; list elements are not
/// addressable.
pub fn get_path<'a>(value: &'a Fragment, path: &str) -> Option<&'a Fragment> {
    if path.is_empty() {
        return Some(value);
    }
    let mut current = value;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}
