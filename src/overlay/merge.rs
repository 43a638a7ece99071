//! Deep merge
//!
//! - Maps: deep-merge by key
//! - Lists: REPLACE (override wins)
//! - Scalars and null: override wins

use serde_json::Value;

use super::Fragment;

/// Deep merge `overlay` onto `base`, returning a new fragment.
///
/// Neither input is modified. Keys only in `base` are preserved, keys only
/// in `overlay` are added, and where both sides hold a map the merge
/// recurses. Any other pairing is decided by `overlay` outright.
pub fn merge(base: &Fragment, overlay: &Fragment) -> Fragment {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut result = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let merged = match result.get(key) {
                    Some(base_value @ Value::Object(_)) if overlay_value.is_object() => {
                        merge(base_value, overlay_value)
                    }
                    _ => overlay_value.clone(),
                };
                result.insert(key.clone(), merged);
            }
            Value::Object(result)
        }

        // Lists, scalars, null, or a shape change: overlay wins
        (_, overlay) => overlay.clone(),
    }
}

/// Merge layers in order (first is base, last has highest precedence).
pub fn merge_layers<I>(layers: I) -> Fragment
where
    I: IntoIterator<Item = Fragment>,
{
    let mut iter = layers.into_iter();
    let first = match iter.next() {
        Some(first) => first,
        None => return super::empty(),
    };
    iter.fold(first, |acc, layer| merge(&acc, &layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let base = json!({"colors": {"primary": "#000"}});
        let overlay = json!({"colors": {"primary": "#f00"}});
        let result = merge(&base, &overlay);
        assert_eq!(result, json!({"colors": {"primary": "#f00"}}));
    }

    #[test]
    fn test_identity_with_empty_overlay() {
        let base = json!({
            "tokens": {"colors": {"primary": "#000"}, "zIndex": {"modal": 1200}},
            "meta": {"tags": ["a", "b"]}
        });
        assert_eq!(merge(&base, &json!({})), base);
    }

    #[test]
    fn test_object_deep_merge() {
        let base = json!({
            "spacing": {"sm": "0.5rem", "md": "1rem"}
        });
        let overlay = json!({
            "spacing": {"md": "1.25rem"}
        });
        let result = merge(&base, &overlay);

        assert_eq!(result["spacing"]["md"], "1.25rem");
        assert_eq!(result["spacing"]["sm"], "0.5rem");
    }

    #[test]
    fn test_list_replaced_not_merged() {
        let base = json!({"a": [1, 2, 3]});
        let overlay = json!({"a": [9]});
        assert_eq!(merge(&base, &overlay), json!({"a": [9]}));
    }

    #[test]
    fn test_disjoint_keys() {
        let base = json!({"a": 1});
        let overlay = json!({"b": 2});
        let result = merge(&base, &overlay);

        assert_eq!(result["a"], 1);
        assert_eq!(result["b"], 2);
    }

    #[test]
    fn test_null_override() {
        let base = json!({"value": 100});
        let overlay = json!({"value": null});
        let result = merge(&base, &overlay);

        assert!(result["value"].is_null());
    }

    #[test]
    fn test_shape_change_override_wins() {
        let base = json!({"slot": {"type": "Hero"}});
        let overlay = json!({"slot": "none"});
        assert_eq!(merge(&base, &overlay), json!({"slot": "none"}));

        let base = json!({"slot": "none"});
        let overlay = json!({"slot": {"type": "Hero"}});
        assert_eq!(merge(&base, &overlay), json!({"slot": {"type": "Hero"}}));
    }

    #[test]
    fn test_top_level_non_map() {
        assert_eq!(merge(&json!({"a": 1}), &json!([1])), json!([1]));
        assert_eq!(merge(&json!("x"), &json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn test_inputs_untouched() {
        let base = json!({"a": {"b": 1}});
        let overlay = json!({"a": {"c": 2}});
        let _ = merge(&base, &overlay);
        assert_eq!(base, json!({"a": {"b": 1}}));
        assert_eq!(overlay, json!({"a": {"c": 2}}));
    }

    #[test]
    fn test_not_commutative() {
        let x = json!({"k": 1});
        let y = json!({"k": 2});
        assert_ne!(merge(&x, &y), merge(&y, &x));
    }

    #[test]
    fn test_merge_layers() {
        let preset = json!({
            "colors": {"primary": "#000", "secondary": "#111"},
            "radius": {"sm": "2px"}
        });
        let tenant = json!({
            "colors": {"primary": "#f00"}
        });
        let campaign = json!({
            "radius": {"sm": "4px"}
        });

        let result = merge_layers(vec![preset.clone(), tenant.clone(), campaign.clone()]);

        assert_eq!(result["colors"]["primary"], "#f00");
        assert_eq!(result["colors"]["secondary"], "#111");
        assert_eq!(result["radius"]["sm"], "4px");

        // Left-to-right composition is associative
        let stepwise = merge(&merge(&preset, &tenant), &campaign);
        assert_eq!(result, stepwise);
    }

    #[test]
    fn test_merge_layers_empty() {
        assert_eq!(merge_layers(Vec::new()), json!({}));
    }

    #[test]
    fn test_nested_deep_merge() {
        let base = json!({
            "pages": {
                "/": {
                    "template": "DashboardLayout",
                    "slots": {"header": {"props": {"title": "A", "subtitle": "B"}}}
                }
            }
        });
        let overlay = json!({
            "pages": {
                "/": {"slots": {"header": {"props": {"title": "C"}}}}
            }
        });
        let result = merge(&base, &overlay);

        assert_eq!(result["pages"]["/"]["template"], "DashboardLayout");
        assert_eq!(result["pages"]["/"]["slots"]["header"]["props"]["title"], "C");
        assert_eq!(result["pages"]["/"]["slots"]["header"]["props"]["subtitle"], "B");
    }
}
