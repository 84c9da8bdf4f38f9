#![allow(dead_code)]

use std::path::PathBuf;

use anonflux_core::anonymize::anonymize;
use anonflux_core::flatten::flatten;
use anonflux_core::{RawUserRecord, Table};
use serde_json::Value;

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/randomuser_sample.json")
}

pub fn fixture_records() -> Vec<RawUserRecord> {
    let contents = std::fs::read_to_string(fixture_path()).expect("read fixture");
    let payload: Value = serde_json::from_str(&contents).expect("parse fixture");
    payload["results"]
        .as_array()
        .expect("results array")
        .iter()
        .cloned()
        .map(|value| RawUserRecord::try_from(value).expect("object record"))
        .collect()
}

/// The sample records, anonymized and flattened.
pub fn fixture_table() -> Table {
    flatten(&anonymize(fixture_records())).expect("flatten fixture")
}
