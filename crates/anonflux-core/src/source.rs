use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::record::RawUserRecord;

pub const DEFAULT_SOURCE_URL: &str = "https://randomuser.me/api/";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed record payload")]
    Json(#[from] serde_json::Error),
    #[error("result {index} is not a JSON object")]
    NotAnObject { index: usize },
}

/// Where raw user records come from.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, count: usize) -> Result<Vec<RawUserRecord>, SourceError>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Envelope { results: Vec<Value> },
    Bare(Vec<Value>),
}

impl Payload {
    fn into_records(self) -> Result<Vec<RawUserRecord>, SourceError> {
        let values = match self {
            Payload::Envelope { results } => results,
            Payload::Bare(values) => values,
        };
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                RawUserRecord::try_from(value).map_err(|_| SourceError::NotAnObject { index })
            })
            .collect()
    }
}

/// The public randomuser.me API (or anything serving the same envelope).
#[derive(Debug, Clone)]
pub struct RandomUserSource {
    client: reqwest::Client,
    url: String,
}

impl RandomUserSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Default for RandomUserSource {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_URL)
    }
}

#[async_trait]
impl RecordSource for RandomUserSource {
    async fn fetch(&self, count: usize) -> Result<Vec<RawUserRecord>, SourceError> {
        let http_err = |source| SourceError::Http {
            url: self.url.clone(),
            source,
        };

        let body = self
            .client
            .get(&self.url)
            .query(&[("results", count)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(http_err)?
            .bytes()
            .await
            .map_err(http_err)?;

        let records = serde_json::from_slice::<Payload>(&body)?.into_records()?;
        info!(url = %self.url, requested = count, received = records.len(), "fetched user records");
        Ok(records)
    }
}

/// Records stored in a local JSON file, either the API envelope or a bare
/// array. At most `count` records are returned.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn fetch(&self, count: usize) -> Result<Vec<RawUserRecord>, SourceError> {
        let contents = std::fs::read(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let mut records = serde_json::from_slice::<Payload>(&contents)?.into_records()?;
        records.truncate(count);
        info!(path = %self.path.display(), received = records.len(), "loaded user records");
        Ok(records)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<RawUserRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<RawUserRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    async fn fetch(&self, count: usize) -> Result<Vec<RawUserRecord>, SourceError> {
        Ok(self.records.iter().take(count).cloned().collect())
    }
}
