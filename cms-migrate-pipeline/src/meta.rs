//! Conversion of schemaless legacy values into structured JSON.
use cms_migrate_shared::types::{LegacyMeta, MetaEntry};
use serde_json::{Value, json};

use crate::php_serialized;

/// Wraps a legacy meta value for a JSON meta column.
///
/// JSON objects and arrays are kept as they are, PHP-serialized arrays and
/// objects are decoded, and anything else is stored as `{"raw": value}`. A
/// PHP-serialized scalar is stored decoded under `raw`.
pub fn structured_value(raw: Option<&str>) -> Value {
    let Some(raw) = raw else {
        return json!({ "raw": Value::Null });
    };
    if let Ok(value @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str::<Value>(raw) {
        return strip_null_bytes(value);
    }
    if php_serialized::looks_serialized(raw) {
        match php_serialized::decode(raw) {
            Some(value @ (Value::Object(_) | Value::Array(_))) => return strip_null_bytes(value),
            Some(scalar) => return json!({ "raw": strip_null_bytes(scalar) }),
            None => {}
        }
    }
    json!({ "raw": strip_nul(raw) })
}

/// Parses an option value: any JSON value, else PHP-serialized data, else the
/// raw string.
pub fn setting_value(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return strip_null_bytes(value);
    }
    if php_serialized::looks_serialized(raw) {
        if let Some(value) = php_serialized::decode(raw) {
            return strip_null_bytes(value);
        }
    }
    Value::String(strip_nul(raw))
}

/// Removes NUL characters from every string inside `value`, keys included.
pub fn strip_null_bytes(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(strip_nul(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_null_bytes).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (strip_nul(&k), strip_null_bytes(v)))
                .collect(),
        ),
        other => other,
    }
}

fn strip_nul(s: &str) -> String {
    s.replace('\u{0}', "")
}

/// Converts legacy meta rows into entries, keeping the first row of each key.
pub fn meta_entries<'a>(rows: impl IntoIterator<Item = &'a LegacyMeta>) -> Vec<MetaEntry> {
    let mut entries: Vec<MetaEntry> = Vec::new();
    for row in rows {
        if entries.iter().any(|entry| entry.key == row.key) {
            continue;
        }
        entries.push(MetaEntry::new(
            row.key.clone(),
            structured_value(row.value.as_deref()),
        ));
    }
    entries
}

/// Returns the value of the first row carrying `key`.
pub fn find_value<'a>(rows: &'a [LegacyMeta], key: &str) -> Option<&'a str> {
    rows.iter()
        .find(|row| row.key == key)
        .and_then(|row| row.value.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_value_shapes() {
        assert_eq!(structured_value(Some(r#"{"a":1}"#)), json!({"a": 1}));
        assert_eq!(structured_value(Some("[1,2]")), json!([1, 2]));
        assert_eq!(structured_value(Some("42")), json!({"raw": "42"}));
        assert_eq!(structured_value(Some("hello")), json!({"raw": "hello"}));
        assert_eq!(structured_value(None), json!({"raw": null}));
        assert_eq!(
            structured_value(Some(r#"a:1:{i:0;s:3:"nav";}"#)),
            json!(["nav"])
        );
    }

    #[test]
    fn test_php_scalars_are_wrapped() {
        assert_eq!(structured_value(Some(r#"s:3:"abc";"#)), json!({"raw": "abc"}));
        assert_eq!(structured_value(Some("i:5;")), json!({"raw": 5}));
        assert_eq!(structured_value(Some("N;")), json!({"raw": null}));
    }

    #[test]
    fn test_overly_nested_php_falls_back_to_raw() {
        let depth = 10_000;
        let raw = format!("{}N;{}", "a:1:{i:0;".repeat(depth), "}".repeat(depth));
        assert_eq!(structured_value(Some(&raw)), json!({ "raw": raw.clone() }));
        assert_eq!(setting_value(&raw), Value::String(raw));
    }

    #[test]
    fn test_setting_value_shapes() {
        assert_eq!(setting_value("true"), json!(true));
        assert_eq!(setting_value("3"), json!(3));
        assert_eq!(setting_value("My Blog"), json!("My Blog"));
        assert_eq!(setting_value(r#"a:1:{s:1:"k";b:1;}"#), json!({"k": true}));
    }

    #[test]
    fn test_null_bytes_are_removed_recursively() {
        assert_eq!(setting_value("a\u{0}b"), json!("ab"));
        let nested = json!({"k\u{0}": ["x\u{0}y", {"z": "\u{0}"}]});
        assert_eq!(strip_null_bytes(nested), json!({"k": ["xy", {"z": ""}]}));
    }

    #[test]
    fn test_meta_entries_keep_first_duplicate() {
        let rows = vec![
            LegacyMeta {
                meta_id: 1,
                owner_id: 5,
                key: "color".to_string(),
                value: Some("red".to_string()),
            },
            LegacyMeta {
                meta_id: 2,
                owner_id: 5,
                key: "color".to_string(),
                value: Some("blue".to_string()),
            },
        ];
        let entries = meta_entries(&rows);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, json!({"raw": "red"}));
        assert_eq!(find_value(&rows, "color"), Some("red"));
        assert_eq!(find_value(&rows, "size"), None);
    }
}
