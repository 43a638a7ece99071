//! Generic descriptor walker

use serde_json::{Map, Value};

use super::descriptor::{Expect, Field, Presence};
use crate::error::ValidationError;

/// Walk `value` against `fields`, appending every violation.
pub(crate) fn check_object(
    value: &Value,
    fields: &[Field],
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    let map = match value.as_object() {
        Some(map) => map,
        None => {
            errors.push(ValidationError::schema(
                path,
                format!("{} must be a map", display(path)),
            ));
            return;
        }
    };

    for field in fields {
        let field_path = join(path, field.name);
        match (field.presence, map.get(field.name)) {
            (Presence::Forbidden(reason), Some(_)) => {
                errors.push(ValidationError::schema(
                    &field_path,
                    format!("{}: {}", field_path, reason),
                ));
            }
            (Presence::Forbidden(_), None) => {}
            (Presence::Required, None) => {
                errors.push(ValidationError::schema(
                    &field_path,
                    format!("{} is required", field_path),
                ));
            }
            (Presence::Optional, None) => {}
            (_, Some(child)) => check_value(child, &field.expect, &field_path, errors),
        }
    }
}

fn check_value(value: &Value, expect: &Expect, path: &str, errors: &mut Vec<ValidationError>) {
    match expect {
        Expect::Any => {}
        Expect::String => {
            if !value.is_string() {
                errors.push(ValidationError::schema(path, format!("{} must be a string", path)));
            }
        }
        Expect::Integer => {
            if !(value.is_i64() || value.is_u64()) {
                errors.push(ValidationError::schema(
                    path,
                    format!("{} must be an integer", path),
                ));
            }
        }
        Expect::StringList => match value.as_array() {
            None => {
                errors.push(ValidationError::schema(path, format!("{} must be a list", path)));
            }
            Some(items) if !items.iter().all(Value::is_string) => {
                errors.push(ValidationError::schema(
                    path,
                    format!("{} must contain only strings", path),
                ));
            }
            Some(_) => {}
        },
        Expect::Map => {
            expect_map(value, path, errors);
        }
        Expect::NonEmptyMap => {
            if let Some(map) = expect_map(value, path, errors) {
                if map.is_empty() {
                    errors.push(ValidationError::schema(
                        path,
                        format!("{} must not be empty", path),
                    ));
                }
            }
        }
        Expect::Object(fields) => check_object(value, fields, path, errors),
        Expect::EachEntry(inner) => {
            if let Some(map) = expect_map(value, path, errors) {
                check_entries(map, inner, path, errors);
            }
        }
        Expect::NonEmptyEach(inner) => {
            if let Some(map) = expect_map(value, path, errors) {
                if map.is_empty() {
                    errors.push(ValidationError::schema(
                        path,
                        format!("{} must not be empty", path),
                    ));
                }
                check_entries(map, inner, path, errors);
            }
        }
    }
}

fn check_entries(
    map: &Map<String, Value>,
    inner: &Expect,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    for (key, child) in map {
        check_value(child, inner, &join(path, key), errors);
    }
}

fn expect_map<'a>(
    value: &'a Value,
    path: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<&'a Map<String, Value>> {
    let map = value.as_object();
    if map.is_none() {
        errors.push(ValidationError::schema(
            path,
            format!("{} must be a map", display(path)),
        ));
    }
    map
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn display(path: &str) -> &str {
    if path.is_empty() {
        "document"
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LEAF: Expect = Expect::Integer;
    const TABLE: &[Field] = &[
        Field::required("name", Expect::String),
        Field::optional("tags", Expect::StringList),
        Field::required("levels", Expect::EachEntry(&LEAF)),
        Field::forbidden("legacy", "legacy layout"),
    ];

    fn run(value: Value) -> Vec<String> {
        let mut errors = Vec::new();
        check_object(&value, TABLE, "", &mut errors);
        errors.into_iter().map(|e| e.path).collect()
    }

    #[test]
    fn test_valid_value_has_no_errors() {
        assert!(run(json!({"name": "x", "levels": {"a": 1}})).is_empty());
    }

    #[test]
    fn test_collects_all_violations() {
        let paths = run(json!({
            "tags": ["ok", 3],
            "levels": {"a": 1, "b": "two", "c": 2.5},
            "legacy": []
        }));
        assert_eq!(paths, vec!["name", "tags", "levels.b", "levels.c", "legacy"]);
    }

    #[test]
    fn test_non_map_root() {
        let mut errors = Vec::new();
        check_object(&json!([1, 2]), TABLE, "", &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "document must be a map");
    }
}
