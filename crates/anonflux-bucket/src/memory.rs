use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{BlobStore, BucketError};

type Buckets = HashMap<String, HashMap<String, Bytes>>;

/// Process-local store with S3 semantics: puts into a bucket that was never
/// created fail with [`BucketError::BucketNotFound`].
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    buckets: Mutex<Buckets>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bucket_exists(&self, bucket: &str) -> bool {
        self.lock()
            .map(|buckets| buckets.contains_key(bucket))
            .unwrap_or(false)
    }

    pub fn object_count(&self, bucket: &str) -> usize {
        self.lock()
            .ok()
            .and_then(|buckets| buckets.get(bucket).map(HashMap::len))
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Buckets>, BucketError> {
        self.buckets
            .lock()
            .map_err(|_| BucketError::Backend("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), BucketError> {
        if bucket.is_empty() {
            return Err(BucketError::Configuration(
                "bucket name cannot be empty".into(),
            ));
        }
        self.lock()?.entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), BucketError> {
        let mut buckets = self.lock()?;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| BucketError::BucketNotFound(bucket.to_string()))?;
        objects.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, BucketError> {
        let buckets = self.lock()?;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| BucketError::BucketNotFound(bucket.to_string()))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| BucketError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}
