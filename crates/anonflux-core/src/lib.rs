//! Anonymize → flatten → encrypt → upload, and the reverse for analysis.

pub mod anonymize;
pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod flatten;
pub mod keyfile;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod source;
pub mod staging;
pub mod stats;

pub use error::{PipelineError, Result};
pub use record::{AnonymizedRecord, ColumnKind, ColumnSpec, FlatRow, RawUserRecord, Scalar, Table};
