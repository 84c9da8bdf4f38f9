//! Producer: fetch → anonymize → flatten → serialize → encrypt → upload.
//! Consumer: download → decrypt → deserialize.
//!
//! Stages run strictly in order and the first failure aborts the run, so
//! nothing is uploaded unless every earlier stage succeeded.

use std::path::Path;

use anonflux_bucket::BlobStore;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::anonymize::anonymize;
use crate::codec;
use crate::config::MinioConfig;
use crate::envelope::{self, generate_key, SymmetricKey};
use crate::error::{PipelineError, Result};
use crate::flatten::flatten;
use crate::keyfile::stage_key_file;
use crate::record::Table;
use crate::source::RecordSource;
use crate::staging::{decrypted_file_name, encrypted_object_name, StagingArea};

pub const TOKEN_CONTENT_TYPE: &str = "application/octet-stream";

/// Bucket and object name of the encrypted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectTarget {
    pub bucket: String,
    pub object_name: String,
}

impl ObjectTarget {
    pub fn new(bucket: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object_name: object_name.into(),
        }
    }

    /// Target for the encrypted form of a local artifact, e.g.
    /// `users.parquet` → `users.parquet.enc`.
    pub fn for_artifact(bucket: impl Into<String>, artifact_name: &str) -> Self {
        Self::new(bucket, encrypted_object_name(artifact_name))
    }

    pub fn from_config(config: &MinioConfig) -> Self {
        Self::new(config.bucket_name.clone(), config.object_name.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProduceReport {
    pub target: ObjectTarget,
    pub records: usize,
    pub artifact_bytes: usize,
    pub token_bytes: usize,
}

pub async fn produce(
    source: &dyn RecordSource,
    store: &dyn BlobStore,
    target: &ObjectTarget,
    key: &SymmetricKey,
    count: usize,
) -> Result<ProduceReport> {
    let raw = source.fetch(count).await?;
    if raw.is_empty() {
        return Err(PipelineError::NoRecords);
    }
    info!(records = raw.len(), "fetched raw records");

    let anonymized = anonymize(raw);
    let table = flatten(&anonymized)?;
    info!(rows = table.len(), columns = table.columns().len(), "flattened records");

    let artifact = codec::serialize(&table)?;
    let token = envelope::encrypt(&artifact, key)?;
    info!(artifact_bytes = artifact.len(), token_bytes = token.len(), "encrypted artifact");

    store.ensure_bucket(&target.bucket).await?;
    let token_bytes = token.len();
    store
        .put_object(
            &target.bucket,
            &target.object_name,
            Bytes::from(token),
            TOKEN_CONTENT_TYPE,
        )
        .await?;
    info!(bucket = %target.bucket, object = %target.object_name, "uploaded encrypted artifact");

    Ok(ProduceReport {
        target: target.clone(),
        records: table.len(),
        artifact_bytes: artifact.len(),
        token_bytes,
    })
}

/// Runs [`produce`] under a freshly generated key. The key is staged beside
/// `key_path` before anything is fetched and replaces the key file only once
/// the upload succeeded. On any failure the previous key file is untouched.
pub async fn produce_with_new_key(
    source: &dyn RecordSource,
    store: &dyn BlobStore,
    target: &ObjectTarget,
    key_path: &Path,
    count: usize,
) -> Result<ProduceReport> {
    let key = generate_key();
    let pending = stage_key_file(key_path, &key)?;
    let report = produce(source, store, target, &key, count).await?;
    pending.commit()?;
    Ok(report)
}

/// Downloads and decrypts the artifact. The decrypted Parquet file is staged
/// in a private directory that is removed before this returns, whether or not
/// loading succeeded.
pub async fn consume(
    store: &dyn BlobStore,
    target: &ObjectTarget,
    key: &SymmetricKey,
) -> Result<Table> {
    let token = store.get_object(&target.bucket, &target.object_name).await?;
    info!(bucket = %target.bucket, object = %target.object_name, bytes = token.len(), "downloaded encrypted artifact");

    let plaintext = envelope::decrypt(&token, key)?;
    drop(token);

    let staging = StagingArea::new()?;
    let staged = staging.write(&decrypted_file_name(&target.object_name), &plaintext)?;
    drop(plaintext);

    let table = codec::read_file(&staged);
    let closed = staging.close();
    let table = table?;
    closed?;

    info!(rows = table.len(), "loaded decrypted artifact");
    Ok(table)
}
