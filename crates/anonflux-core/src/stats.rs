//! Summary statistics over a user table.

use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::codec::{to_frame, CodecError};
use crate::record::Table;

pub const DEFAULT_TOP_LOCATIONS: usize = 10;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("polars operation failed")]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("row {row}: registered_date {value:?} is not an RFC 3339 timestamp")]
    InvalidTimestamp { row: usize, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderCount {
    pub gender: String,
    pub users: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCount {
    pub country: String,
    pub city: String,
    pub users: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub users: usize,
    /// None when no row carries a registration date.
    pub average_days_since_registered: Option<f64>,
    pub gender_counts: Vec<GenderCount>,
    pub top_locations: Vec<LocationCount>,
}

pub fn summarize(table: &Table, now: DateTime<Utc>, top_n: usize) -> Result<UserSummary, StatsError> {
    let frame = to_frame(table)?;
    Ok(UserSummary {
        users: frame.height(),
        average_days_since_registered: average_days_since_registered(&frame, now)?,
        gender_counts: gender_counts(&frame)?,
        top_locations: top_locations(&frame, top_n)?,
    })
}

/// Mean of whole elapsed days (floored) between `registered_date` and `now`.
pub fn average_days_since_registered(
    frame: &DataFrame,
    now: DateTime<Utc>,
) -> Result<Option<f64>, StatsError> {
    let dates = frame
        .column("registered_date")?
        .as_materialized_series()
        .str()?;

    let mut days = Vec::with_capacity(dates.len());
    for (row, value) in dates.into_iter().enumerate() {
        let Some(value) = value else {
            continue;
        };
        let registered = DateTime::parse_from_rfc3339(value).map_err(|_| {
            StatsError::InvalidTimestamp {
                row,
                value: value.to_string(),
            }
        })?;
        let elapsed = now.signed_duration_since(registered.with_timezone(&Utc));
        days.push(elapsed.num_seconds().div_euclid(SECONDS_PER_DAY));
    }

    Ok(Series::new("days_since_registered".into(), days).mean())
}

/// User counts per gender, most common first. Rows without a gender are skipped.
pub fn gender_counts(frame: &DataFrame) -> Result<Vec<GenderCount>, StatsError> {
    let counts = frame
        .clone()
        .lazy()
        .filter(col("gender").is_not_null())
        .group_by([col("gender")])
        .agg([len().cast(DataType::UInt32).alias("users")])
        .sort(
            ["users", "gender"],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .collect()?;

    let genders = counts.column("gender")?.as_materialized_series().str()?;
    let users = counts.column("users")?.as_materialized_series().u32()?;

    Ok(genders
        .into_iter()
        .zip(users.into_iter())
        .filter_map(|(gender, users)| {
            Some(GenderCount {
                gender: gender?.to_string(),
                users: users?,
            })
        })
        .collect())
}

/// The `top_n` most common (country, city) pairs.
pub fn top_locations(frame: &DataFrame, top_n: usize) -> Result<Vec<LocationCount>, StatsError> {
    let counts = frame
        .clone()
        .lazy()
        .filter(col("country").is_not_null().and(col("city").is_not_null()))
        .group_by([col("country"), col("city")])
        .agg([len().cast(DataType::UInt32).alias("users")])
        .sort(
            ["users", "country", "city"],
            SortMultipleOptions::default().with_order_descending_multi([true, false, false]),
        )
        .limit(top_n.min(IdxSize::MAX as usize) as IdxSize)
        .collect()?;

    let countries = counts.column("country")?.as_materialized_series().str()?;
    let cities = counts.column("city")?.as_materialized_series().str()?;
    let users = counts.column("users")?.as_materialized_series().u32()?;

    Ok(countries
        .into_iter()
        .zip(cities.into_iter())
        .zip(users.into_iter())
        .filter_map(|((country, city), users)| {
            Some(LocationCount {
                country: country?.to_string(),
                city: city?.to_string(),
                users: users?,
            })
        })
        .collect())
}
