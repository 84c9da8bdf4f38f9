use std::fmt;
use std::path::Path;

use anonflux_bucket::S3Config;
use serde::Deserialize;
use thiserror::Error;

use crate::source::DEFAULT_SOURCE_URL;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_KEY_PATH: &str = "encryption_key.key";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_RECORD_COUNT: usize = 100;

const ENV_ENDPOINT: &str = "ANONFLUX_MINIO_ENDPOINT";
const ENV_ACCESS_KEY: &str = "ANONFLUX_MINIO_ACCESS_KEY";
const ENV_SECRET_KEY: &str = "ANONFLUX_MINIO_SECRET_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub minio: MinioConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

#[derive(Clone, Deserialize)]
pub struct MinioConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub secure: bool,
    pub bucket_name: String,
    pub object_name: String,
    #[serde(default = "default_region")]
    pub region: String,
}

impl fmt::Debug for MinioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinioConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("secure", &self.secure)
            .field("bucket_name", &self.bucket_name)
            .field("object_name", &self.object_name)
            .field("region", &self.region)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_url")]
    pub url: String,
    #[serde(default = "default_record_count")]
    pub count: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            count: default_record_count(),
        }
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_record_count() -> usize {
    DEFAULT_RECORD_COUNT
}

impl AppConfig {
    /// Reads the JSON config, applies `ANONFLUX_MINIO_*` environment overrides
    /// and validates the result.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let mut config = Self::from_json(&contents).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());
        if let Some(endpoint) = non_empty(ENV_ENDPOINT) {
            self.minio.endpoint = endpoint;
        }
        if let Some(access_key) = non_empty(ENV_ACCESS_KEY) {
            self.minio.access_key = access_key;
        }
        if let Some(secret_key) = non_empty(ENV_SECRET_KEY) {
            self.minio.secret_key = secret_key;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.minio.validate()?;
        if self.source.count == 0 {
            return Err(invalid("source.count", "must be at least 1"));
        }
        if self.source.url.trim().is_empty() {
            return Err(invalid("source.url", "cannot be empty"));
        }
        Ok(())
    }
}

impl MinioConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require("minio.endpoint", &self.endpoint)?;
        require("minio.access_key", &self.access_key)?;
        require("minio.secret_key", &self.secret_key)?;
        require("minio.object_name", &self.object_name)?;
        require("minio.region", &self.region)?;
        validate_bucket_name(&self.bucket_name)
    }

    pub fn endpoint_url(&self) -> String {
        if self.endpoint.contains("://") {
            return self.endpoint.clone();
        }
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}", self.endpoint)
    }

    pub fn s3_config(&self) -> S3Config {
        S3Config {
            region: self.region.clone(),
            endpoint: Some(self.endpoint_url()),
            access_key_id: Some(self.access_key.clone()),
            secret_access_key: Some(self.secret_key.clone()),
            force_path_style: true,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(invalid(field, "cannot be empty"))
    } else {
        Ok(())
    }
}

// S3 bucket naming rules: 3-63 chars of lowercase letters, digits, '.' and
// '-', starting and ending with a letter or digit.
fn validate_bucket_name(name: &str) -> Result<(), ConfigError> {
    const FIELD: &str = "minio.bucket_name";
    if !(3..=63).contains(&name.len()) {
        return Err(invalid(FIELD, format!("'{name}' must be 3 to 63 characters")));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid(
            FIELD,
            format!("'{name}' may only contain lowercase letters, digits, '-' and '.'"),
        ));
    }
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    if !edge_ok(name.chars().next()) || !edge_ok(name.chars().last()) {
        return Err(invalid(
            FIELD,
            format!("'{name}' must start and end with a letter or digit"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "minio": {
            "endpoint": "localhost:9000",
            "access_key": "minioadmin",
            "secret_key": "minioadmin",
            "secure": false,
            "bucket_name": "users",
            "object_name": "users_anonymized.parquet.enc"
        }
    }"#;

    #[test]
    fn defaults_fill_optional_sections() {
        let config = AppConfig::from_json(SAMPLE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.minio.region, "us-east-1");
        assert_eq!(config.source.count, 100);
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
        assert_eq!(config.minio.endpoint_url(), "http://localhost:9000");
    }

    #[test]
    fn environment_overrides_credentials() {
        let mut config = AppConfig::from_json(SAMPLE).unwrap();
        config.apply_overrides(|name| match name {
            "ANONFLUX_MINIO_SECRET_KEY" => Some("from-env".to_string()),
            "ANONFLUX_MINIO_ACCESS_KEY" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.minio.secret_key, "from-env");
        assert_eq!(config.minio.access_key, "minioadmin");
    }

    #[test]
    fn rejects_invalid_bucket_names() {
        for name in ["ab", "Users", "users_", "-users", "users-"] {
            let mut config = AppConfig::from_json(SAMPLE).unwrap();
            config.minio.bucket_name = name.to_string();
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid { field: "minio.bucket_name", .. })),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        let err = AppConfig::from_json(r#"{"minio": {"endpoint": "x"}}"#);
        assert!(err.is_err());
    }

    #[test]
    fn secure_endpoint_uses_https() {
        let mut config = AppConfig::from_json(SAMPLE).unwrap();
        config.minio.secure = true;
        assert_eq!(config.minio.s3_config().endpoint.as_deref(), Some("https://localhost:9000"));
    }
}
