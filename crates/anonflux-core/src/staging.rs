//! Scratch directory for intermediate artifacts.
//!
//! Staged files may hold decrypted user data. They live in a private
//! temporary directory that is removed when the [`StagingArea`] drops, on
//! success and error paths alike.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

pub const ENCRYPTED_SUFFIX: &str = ".enc";
const DECRYPTED_PREFIX: &str = "decrypted_";

/// `users.parquet` → `users.parquet.enc`
pub fn encrypted_object_name(base_name: &str) -> String {
    format!("{base_name}{ENCRYPTED_SUFFIX}")
}

/// `users.parquet.enc` → `users.parquet`. Names without the suffix are kept as-is.
pub fn decrypted_object_name(object_name: &str) -> &str {
    object_name
        .strip_suffix(ENCRYPTED_SUFFIX)
        .unwrap_or(object_name)
}

pub fn decrypted_file_name(object_name: &str) -> String {
    format!(
        "{DECRYPTED_PREFIX}{}",
        file_component(decrypted_object_name(object_name))
    )
}

// Object names may contain '/' prefixes; staged files stay flat.
fn file_component(object_name: &str) -> &str {
    object_name.rsplit('/').next().unwrap_or(object_name)
}

#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("anonflux-").tempdir()?;
        debug!(path = %dir.path().display(), "created staging area");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, file_name: &str, contents: &[u8]) -> io::Result<PathBuf> {
        let path = self.dir.path().join(file_name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Removes the directory now and reports failures instead of ignoring them on drop.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}
