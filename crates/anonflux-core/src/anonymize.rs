//! Irreversible redaction of sensitive user fields.
//!
//! Every path in [`SENSITIVE_FIELDS`] is overwritten with a constant. The
//! constant never depends on the original value.

use serde_json::{Map, Value};

use crate::record::{AnonymizedRecord, RawUserRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    Text(&'static str),
    Integer(i64),
}

impl Sentinel {
    pub fn to_value(self) -> Value {
        match self {
            Sentinel::Text(text) => Value::String(text.to_string()),
            Sentinel::Integer(number) => Value::from(number),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SensitiveField {
    pub path: &'static [&'static str],
    pub sentinel: Sentinel,
}

const fn redact(path: &'static [&'static str], sentinel: Sentinel) -> SensitiveField {
    SensitiveField { path, sentinel }
}

pub const SENSITIVE_FIELDS: &[SensitiveField] = &[
    redact(&["name", "first"], Sentinel::Text("ANONYMIZED_FIRST")),
    redact(&["name", "last"], Sentinel::Text("ANONYMIZED_LAST")),
    redact(&["location", "street", "number"], Sentinel::Text("ANONYMIZED_NUMBER")),
    redact(&["location", "street", "name"], Sentinel::Text("ANONYMIZED_STREET")),
    redact(&["location", "coordinates", "latitude"], Sentinel::Text("0.0000")),
    redact(&["location", "coordinates", "longitude"], Sentinel::Text("0.0000")),
    redact(&["login", "username"], Sentinel::Text("ANONYMIZED_USERNAME")),
    redact(&["login", "password"], Sentinel::Text("ANONYMIZED_PASSWORD")),
    redact(&["dob", "date"], Sentinel::Text("1970-01-01T00:00:00.000Z")),
    redact(&["dob", "age"], Sentinel::Integer(0)),
    redact(&["phone"], Sentinel::Text("ANONYMIZED_PHONE")),
    redact(&["cell"], Sentinel::Text("ANONYMIZED_CELL")),
];

pub fn anonymize(records: Vec<RawUserRecord>) -> Vec<AnonymizedRecord> {
    records.into_iter().map(anonymize_record).collect()
}

pub fn anonymize_record(record: RawUserRecord) -> AnonymizedRecord {
    let mut fields = record.into_map();
    for field in SENSITIVE_FIELDS {
        overwrite(&mut fields, field.path, field.sentinel);
    }
    AnonymizedRecord::from_map(fields)
}

// Writes the sentinel when every parent object on the path exists.
fn overwrite(fields: &mut Map<String, Value>, path: &[&str], sentinel: Sentinel) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };

    let mut current = fields;
    for segment in parents {
        match current.get_mut(*segment) {
            Some(Value::Object(child)) => current = child,
            _ => return,
        }
    }
    current.insert((*leaf).to_string(), sentinel.to_value());
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(value: Value) -> RawUserRecord {
        RawUserRecord::try_from(value).unwrap()
    }

    #[test]
    fn skips_paths_whose_parent_is_not_an_object() {
        let record = anonymize_record(raw(json!({
            "location": "somewhere",
            "login": null,
        })));

        assert_eq!(record.lookup(&["location"]), Some(&json!("somewhere")));
        assert_eq!(record.lookup(&["login"]), Some(&Value::Null));
        assert!(record.lookup(&["name"]).is_none());
        assert_eq!(record.lookup(&["phone"]), Some(&json!("ANONYMIZED_PHONE")));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(anonymize(Vec::new()).is_empty());
    }
}
