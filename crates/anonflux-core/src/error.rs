use anonflux_bucket::BucketError;
use thiserror::Error;

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::envelope::{DecryptionError, EncryptionError};
use crate::keyfile::KeyError;
use crate::schema::SchemaError;
use crate::source::SourceError;
use crate::stats::StatsError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration error")]
    Config(#[from] ConfigError),

    #[error("record source failed")]
    Source(#[from] SourceError),

    #[error("record source returned no records")]
    NoRecords,

    #[error("flattening failed")]
    Schema(#[from] SchemaError),

    #[error("columnar codec failed")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    #[error("decryption failed")]
    Decryption(#[from] DecryptionError),

    #[error("key handling failed")]
    Key(#[from] KeyError),

    #[error("blob transfer failed")]
    Transfer(#[from] BucketError),

    #[error("staging area I/O failed")]
    Staging(#[from] std::io::Error),

    #[error("statistics failed")]
    Stats(#[from] StatsError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
