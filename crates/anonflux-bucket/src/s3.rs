use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::{debug, info};

use crate::{BlobStore, BucketError};

#[derive(Clone)]
pub struct S3Config {
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        }
    }
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
}

impl S3BlobStore {
    pub async fn new(config: S3Config) -> Result<Self, BucketError> {
        if config.region.is_empty() {
            return Err(BucketError::Configuration(
                "region cannot be empty".into(),
            ));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials = Credentials::new(access_key, secret_key, None, None, "static");
                loader = loader.credentials_provider(SharedCredentialsProvider::new(credentials));
            }
            (None, None) => {}
            _ => {
                return Err(BucketError::Configuration(
                    "access key and secret key must be provided together".into(),
                ))
            }
        }

        let shared_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        let client = Client::from_conf(builder.build());
        Ok(Self { client })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), BucketError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                debug!(bucket, "bucket already exists");
                return Ok(());
            }
            Err(SdkError::ServiceError(service_err)) if service_err.err().is_not_found() => {}
            Err(other) => return Err(BucketError::from_backend(other)),
        }

        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!(bucket, "created bucket");
                Ok(())
            }
            Err(SdkError::ServiceError(service_err))
                if service_err.err().is_bucket_already_owned_by_you() =>
            {
                Ok(())
            }
            Err(other) => Err(BucketError::from_backend(other)),
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), BucketError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError(service_err)
                    if service_err.err().code() == Some("NoSuchBucket") =>
                {
                    BucketError::BucketNotFound(bucket.to_string())
                }
                other => BucketError::from_backend(other),
            })?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, BucketError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError(service_err) => {
                    if service_err.err().is_no_such_key() {
                        BucketError::NotFound {
                            bucket: bucket.to_string(),
                            key: key.to_string(),
                        }
                    } else {
                        BucketError::from_backend(service_err.err())
                    }
                }
                other => BucketError::from_backend(other),
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(BucketError::from_backend)?;
        Ok(data.into_bytes())
    }
}
