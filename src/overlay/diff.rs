//! Structural diff
//!
//! Produces the minimal fragment that, merged over `base`, reproduces
//! `modified`. Only changes and additions are reported; keys removed in
//! `modified` never appear. Lists are atomic, so a single changed element
//! reports the whole list.

use serde_json::{Map, Value};

use super::Fragment;

/// Compute the fragment of keys in `modified` that differ from `base`.
pub fn diff(base: &Fragment, modified: &Fragment) -> Fragment {
    match (base, modified) {
        (Value::Object(base_map), Value::Object(modified_map)) => {
            Value::Object(diff_maps(base_map, modified_map))
        }
        _ if base == modified => super::empty(),
        _ => modified.clone(),
    }
}

fn diff_maps(base: &Map<String, Value>, modified: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();

    for (key, value) in modified {
        match base.get(key) {
            None => {
                out.insert(key.clone(), value.clone());
            }
            Some(Value::Object(base_child)) if value.is_object() => {
                if let Value::Object(modified_child) = value {
                    let nested = diff_maps(base_child, modified_child);
                    if !nested.is_empty() {
                        out.insert(key.clone(), Value::Object(nested));
                    }
                }
            }
            Some(base_value) if base_value != value => {
                out.insert(key.clone(), value.clone());
            }
            Some(_) => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::merge;
    use serde_json::json;

    #[test]
    fn test_diff_identical_is_empty() {
        let x = json!({
            "colors": {"primary": "#000"},
            "tags": ["a"],
            "zIndex": {"modal": 1200}
        });
        assert_eq!(diff(&x, &x), json!({}));
    }

    #[test]
    fn test_diff_reports_changed_leaf_only() {
        let base = json!({
            "colors": {"primary": "#000", "secondary": "#fff"},
            "spacing": {"small": "8px"}
        });
        let modified = json!({
            "colors": {"primary": "#ff0000", "secondary": "#fff"},
            "spacing": {"small": "8px"}
        });
        assert_eq!(diff(&base, &modified), json!({"colors": {"primary": "#ff0000"}}));
    }

    #[test]
    fn test_diff_includes_added_keys() {
        let base = json!({"colors": {"primary": "#000"}});
        let modified = json!({"colors": {"primary": "#000", "accent": "#0f0"}, "extra": {"a": 1}});
        assert_eq!(
            diff(&base, &modified),
            json!({"colors": {"accent": "#0f0"}, "extra": {"a": 1}})
        );
    }

    #[test]
    fn test_diff_ignores_removals() {
        let base = json!({"a": 1, "b": 2});
        let modified = json!({"a": 1});
        assert_eq!(diff(&base, &modified), json!({}));
    }

    #[test]
    fn test_diff_whole_list_on_element_change() {
        let base = json!({"tags": ["a", "b", "c"]});
        let modified = json!({"tags": ["a", "x", "c"]});
        assert_eq!(diff(&base, &modified), json!({"tags": ["a", "x", "c"]}));
    }

    #[test]
    fn test_diff_shape_change() {
        let base = json!({"slot": {"type": "Hero"}});
        let modified = json!({"slot": "none"});
        assert_eq!(diff(&base, &modified), json!({"slot": "none"}));
    }

    #[test]
    fn test_diff_top_level_non_map() {
        assert_eq!(diff(&json!(1), &json!(1)), json!({}));
        assert_eq!(diff(&json!(1), &json!(2)), json!(2));
        assert_eq!(diff(&json!({"a": 1}), &json!([1])), json!([1]));
    }

    #[test]
    fn test_round_trip_maps_and_scalars() {
        let base = json!({
            "colors": {"primary": "#000", "secondary": "#111"},
            "motion": {"duration": {"fast": 150, "slow": 500}},
            "flag": true
        });
        let modified = json!({
            "colors": {"primary": "#f00", "secondary": "#111"},
            "motion": {"duration": {"fast": 100, "slow": 500}, "easing": {"linear": "linear"}},
            "flag": true
        });

        let patch = diff(&base, &modified);
        assert_eq!(merge(&base, &patch), modified);
    }
}
