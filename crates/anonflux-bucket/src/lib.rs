//! Blob transfer against S3-compatible object stores (MinIO in practice).
//!
//! The pipeline only needs three operations: make sure a bucket exists, put a
//! named blob, and get it back. Failures are surfaced as [`BucketError`] and
//! never retried here.

mod memory;
mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

pub use memory::MemoryBlobStore;
pub use s3::{S3BlobStore, S3Config};

#[derive(Debug, Error)]
pub enum BucketError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("bucket not found: {0}")]
    BucketNotFound(String),
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },
}

impl BucketError {
    pub(crate) fn from_backend(err: impl fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Creates `bucket` if it does not exist yet. Calling it for an existing
    /// bucket is a no-op.
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), BucketError>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), BucketError>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, BucketError>;
}
