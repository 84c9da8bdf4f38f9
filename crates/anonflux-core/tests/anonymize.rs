use std::collections::HashSet;

use anonflux_core::anonymize::{anonymize, SENSITIVE_FIELDS};
use anonflux_core::RawUserRecord;
use serde_json::{json, Value};

mod common;

use common::fixture_records;

fn leaf_paths(value: &Value, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                prefix.push(key.clone());
                leaf_paths(child, prefix, out);
                prefix.pop();
            }
        }
        _ => out.push(prefix.clone()),
    }
}

fn lookup<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| current.get(segment))
}

#[test]
fn sentinels_replace_sensitive_fields_and_everything_else_is_untouched() {
    let raw = fixture_records();
    let anonymized = anonymize(raw.clone());
    assert_eq!(anonymized.len(), raw.len());

    let sensitive: HashSet<Vec<String>> = SENSITIVE_FIELDS
        .iter()
        .map(|field| field.path.iter().map(|s| s.to_string()).collect())
        .collect();

    for (original, redacted) in raw.iter().zip(&anonymized) {
        let original = Value::Object(original.as_map().clone());
        let redacted = Value::Object(redacted.as_map().clone());

        for field in SENSITIVE_FIELDS {
            let path: Vec<String> = field.path.iter().map(|s| s.to_string()).collect();
            assert_eq!(
                lookup(&redacted, &path),
                Some(&field.sentinel.to_value()),
                "{path:?} not redacted"
            );
        }

        let mut original_leaves = Vec::new();
        leaf_paths(&original, &mut Vec::new(), &mut original_leaves);
        for path in original_leaves.iter().filter(|path| !sensitive.contains(*path)) {
            assert_eq!(lookup(&redacted, path), lookup(&original, path), "{path:?} changed");
        }

        let mut redacted_leaves = Vec::new();
        leaf_paths(&redacted, &mut Vec::new(), &mut redacted_leaves);
        assert_eq!(redacted_leaves.len(), original_leaves.len());
    }
}

#[test]
fn sentinels_do_not_depend_on_the_original_value() {
    let records = vec![
        RawUserRecord::try_from(json!({"name": {"first": "Jane", "last": "Doe"}})).unwrap(),
        RawUserRecord::try_from(json!({"name": {"first": "John", "last": "Smith"}})).unwrap(),
    ];

    let anonymized = anonymize(records);

    assert_eq!(anonymized[0].lookup(&["name"]), anonymized[1].lookup(&["name"]));
    assert_eq!(
        anonymized[0].lookup(&["name", "first"]),
        Some(&json!("ANONYMIZED_FIRST"))
    );
}

#[test]
fn partial_records_are_tolerated() {
    let record = RawUserRecord::try_from(json!({
        "gender": "female",
        "location": {"city": "Kotka"},
        "dob": {"date": "1984-02-11T20:36:47.622Z"},
    }))
    .unwrap();

    let anonymized = anonymize(vec![record]);
    let record = &anonymized[0];

    assert_eq!(record.lookup(&["gender"]), Some(&json!("female")));
    assert_eq!(record.lookup(&["location", "city"]), Some(&json!("Kotka")));
    assert!(record.lookup(&["location", "street"]).is_none());
    assert!(record.lookup(&["location", "coordinates"]).is_none());
    assert!(record.lookup(&["login"]).is_none());
    assert_eq!(record.lookup(&["dob", "date"]), Some(&json!("1970-01-01T00:00:00.000Z")));
    assert_eq!(record.lookup(&["dob", "age"]), Some(&json!(0)));
}
