use serde_json::Value;

use crate::record::{AnonymizedRecord, ColumnKind, FlatRow, Scalar, Table};
use crate::schema::{user_columns, FieldMapping, SchemaError, USER_SCHEMA};

/// Projects every anonymized record into one row of the fixed user schema.
/// Missing paths become null; the output always carries every column.
pub fn flatten(records: &[AnonymizedRecord]) -> Result<Table, SchemaError> {
    let mut table = Table::empty(user_columns());
    for (index, record) in records.iter().enumerate() {
        table.push(flatten_record(index, record)?);
    }
    Ok(table)
}

pub fn flatten_record(index: usize, record: &AnonymizedRecord) -> Result<FlatRow, SchemaError> {
    let mut row = FlatRow::new();
    for mapping in USER_SCHEMA {
        let value = match record.lookup(mapping.path) {
            None => Scalar::Null,
            Some(value) => to_scalar(index, mapping, value)?,
        };
        row.insert(mapping.column, value);
    }
    Ok(row)
}

fn to_scalar(index: usize, mapping: &FieldMapping, value: &Value) -> Result<Scalar, SchemaError> {
    let non_scalar = |found: &'static str| SchemaError::NonScalar {
        record: index,
        column: mapping.column,
        path: mapping.path.join("."),
        found,
    };
    let mismatch = || SchemaError::TypeMismatch {
        record: index,
        column: mapping.column.to_string(),
        expected: mapping.kind,
        value: value.to_string(),
    };

    match (mapping.kind, value) {
        (_, Value::Null) => Ok(Scalar::Null),
        (_, Value::Object(_)) => Err(non_scalar("an object")),
        (_, Value::Array(_)) => Err(non_scalar("an array")),

        (ColumnKind::Text, Value::String(text)) => Ok(Scalar::Text(text.clone())),
        (ColumnKind::Text, Value::Number(number)) => Ok(Scalar::Text(number.to_string())),
        (ColumnKind::Text, Value::Bool(flag)) => Ok(Scalar::Text(flag.to_string())),

        (ColumnKind::Integer, Value::Number(number)) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                    .map(|float| float as i64)
            })
            .map(Scalar::Integer)
            .ok_or_else(mismatch),
        (ColumnKind::Integer, Value::String(text)) => text
            .trim()
            .parse::<i64>()
            .map(Scalar::Integer)
            .map_err(|_| mismatch()),
        (ColumnKind::Integer, Value::Bool(_)) => Err(mismatch()),
    }
}
