use thiserror::Error;

use crate::record::{ColumnKind, ColumnSpec};

/// Projection of one nested source path into one output column.
/// A path that is absent in the record always yields null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub column: &'static str,
    pub path: &'static [&'static str],
    pub kind: ColumnKind,
}

const fn text(column: &'static str, path: &'static [&'static str]) -> FieldMapping {
    FieldMapping {
        column,
        path,
        kind: ColumnKind::Text,
    }
}

const fn integer(column: &'static str, path: &'static [&'static str]) -> FieldMapping {
    FieldMapping {
        column,
        path,
        kind: ColumnKind::Integer,
    }
}

/// Output schema of the user table, in column order.
pub const USER_SCHEMA: &[FieldMapping] = &[
    text("gender", &["gender"]),
    text("name_title", &["name", "title"]),
    text("name_first", &["name", "first"]),
    text("name_last", &["name", "last"]),
    text("street_number", &["location", "street", "number"]),
    text("street_name", &["location", "street", "name"]),
    text("city", &["location", "city"]),
    text("state", &["location", "state"]),
    text("country", &["location", "country"]),
    text("postcode", &["location", "postcode"]),
    text("latitude", &["location", "coordinates", "latitude"]),
    text("longitude", &["location", "coordinates", "longitude"]),
    text("timezone_offset", &["location", "timezone", "offset"]),
    text("timezone_description", &["location", "timezone", "description"]),
    text("email", &["email"]),
    text("login_uuid", &["login", "uuid"]),
    text("username", &["login", "username"]),
    text("password", &["login", "password"]),
    text("salt", &["login", "salt"]),
    text("md5", &["login", "md5"]),
    text("sha1", &["login", "sha1"]),
    text("sha256", &["login", "sha256"]),
    text("dob_date", &["dob", "date"]),
    integer("dob_age", &["dob", "age"]),
    text("registered_date", &["registered", "date"]),
    integer("registered_age", &["registered", "age"]),
    text("phone", &["phone"]),
    text("cell", &["cell"]),
    text("id_name", &["id", "name"]),
    text("id_value", &["id", "value"]),
    text("picture_large", &["picture", "large"]),
    text("picture_medium", &["picture", "medium"]),
    text("picture_thumbnail", &["picture", "thumbnail"]),
    text("nat", &["nat"]),
];

pub fn user_columns() -> Vec<ColumnSpec> {
    USER_SCHEMA
        .iter()
        .map(|mapping| ColumnSpec::new(mapping.column, mapping.kind))
        .collect()
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("record {record}: column {column} expects a scalar but {path} holds {found}")]
    NonScalar {
        record: usize,
        column: &'static str,
        path: String,
        found: &'static str,
    },
    #[error("record {record}: column {column} expects {expected}, found {value}")]
    TypeMismatch {
        record: usize,
        column: String,
        expected: ColumnKind,
        value: String,
    },
    #[error("row {row} is missing column {column}")]
    MissingColumn { row: usize, column: String },
    #[error("row {row} has column {column} which is not in the table schema")]
    UnexpectedColumn { row: usize, column: String },
    #[error("column {column} has unsupported type {dtype}")]
    UnsupportedType { column: String, dtype: String },
}
