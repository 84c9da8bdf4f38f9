//! Parquet encoding of a [`Table`]. Column types come from the table schema,
//! never from the values, so a text column of digits stays text.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::*;
use thiserror::Error;

use crate::record::{ColumnKind, ColumnSpec, FlatRow, Scalar, Table};
use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("polars operation failed")]
    Polars(#[from] PolarsError),
    #[error("failed to open artifact")]
    Io(#[from] std::io::Error),
}

pub fn serialize(table: &Table) -> Result<Vec<u8>, CodecError> {
    let mut frame = to_frame(table)?;
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        ParquetWriter::new(&mut cursor)
            .with_compression(ParquetCompression::Zstd(None))
            .with_statistics(StatisticsOptions::default())
            .finish(&mut frame)?;
    }
    Ok(buffer)
}

pub fn deserialize(artifact: &[u8]) -> Result<Table, CodecError> {
    let frame = ParquetReader::new(Cursor::new(artifact)).finish()?;
    from_frame(&frame)
}

/// Reads an artifact straight from disk without buffering it first.
pub fn read_file(path: &Path) -> Result<Table, CodecError> {
    let frame = ParquetReader::new(File::open(path)?).finish()?;
    from_frame(&frame)
}

/// Builds a typed DataFrame, rejecting rows that do not match the table schema.
pub fn to_frame(table: &Table) -> Result<DataFrame, CodecError> {
    check_row_columns(table)?;

    let mut columns: Vec<Column> = Vec::with_capacity(table.columns().len());
    for spec in table.columns() {
        let series = match spec.kind {
            ColumnKind::Text => {
                let values = collect_column(table, spec, |value| value.as_text().map(str::to_string))?;
                Series::new(spec.name.as_str().into(), values)
            }
            ColumnKind::Integer => {
                let values = collect_column(table, spec, Scalar::as_integer)?;
                Series::new(spec.name.as_str().into(), values)
            }
        };
        columns.push(series.into());
    }

    Ok(DataFrame::new(columns)?)
}

pub fn from_frame(frame: &DataFrame) -> Result<Table, CodecError> {
    let mut specs = Vec::with_capacity(frame.width());
    let mut rows = vec![FlatRow::new(); frame.height()];

    for column in frame.get_columns() {
        let name = column.name().to_string();
        match column.dtype() {
            DataType::String => {
                let values = column.as_materialized_series().str()?;
                for (row, value) in rows.iter_mut().zip(values.into_iter()) {
                    row.insert(name.clone(), value.map(str::to_string));
                }
                specs.push(ColumnSpec::new(name, ColumnKind::Text));
            }
            dtype if dtype.is_integer() => {
                let widened = column.cast(&DataType::Int64)?;
                let values = widened.as_materialized_series().i64()?;
                for (row, value) in rows.iter_mut().zip(values.into_iter()) {
                    row.insert(name.clone(), value);
                }
                specs.push(ColumnSpec::new(name, ColumnKind::Integer));
            }
            other => {
                return Err(SchemaError::UnsupportedType {
                    column: name,
                    dtype: other.to_string(),
                }
                .into())
            }
        }
    }

    Ok(Table::new(specs, rows))
}

fn check_row_columns(table: &Table) -> Result<(), SchemaError> {
    for (index, row) in table.rows().iter().enumerate() {
        if let Some(extra) = row.columns().find(|column| table.column(column).is_none()) {
            return Err(SchemaError::UnexpectedColumn {
                row: index,
                column: extra.to_string(),
            });
        }
    }
    Ok(())
}

fn collect_column<T>(
    table: &Table,
    spec: &ColumnSpec,
    extract: impl Fn(&Scalar) -> Option<T>,
) -> Result<Vec<Option<T>>, SchemaError> {
    table
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let value = row.get(&spec.name).ok_or_else(|| SchemaError::MissingColumn {
                row: index,
                column: spec.name.clone(),
            })?;
            if !value.fits(spec.kind) {
                return Err(SchemaError::TypeMismatch {
                    record: index,
                    column: spec.name.clone(),
                    expected: spec.kind,
                    value: format!("{value:?}"),
                });
            }
            Ok(extract(value))
        })
        .collect()
}
