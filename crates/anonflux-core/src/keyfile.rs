//! Out-of-band persistence of the symmetric key. The file holds exactly the
//! raw key bytes and is only readable by its owner.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::envelope::{InvalidKeyLength, SymmetricKey};

#[cfg(unix)]
const KEY_FILE_MODE: u32 = 0o600;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to access key file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("key file {path} does not hold a valid key")]
    InvalidLength {
        path: PathBuf,
        #[source]
        source: InvalidKeyLength,
    },
    #[error("failed to install key file {path}; the new key was left at {kept}")]
    Install {
        path: PathBuf,
        kept: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn write_key_file(path: &Path, key: &SymmetricKey) -> Result<(), KeyError> {
    let io_err = |source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(KEY_FILE_MODE);
    }

    let mut file = options.open(path).map_err(io_err)?;
    // mode() only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(KEY_FILE_MODE))
            .map_err(io_err)?;
    }
    file.write_all(key.as_bytes()).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;

    info!(path = %path.display(), "encryption key written");
    Ok(())
}

/// A key written beside its final path but not yet installed there.
/// Dropping it removes the staged file and leaves any existing key alone.
#[derive(Debug)]
pub struct PendingKeyFile {
    file: NamedTempFile,
    path: PathBuf,
}

/// Writes `key` to an owner-only temporary file in the directory of `path`.
pub fn stage_key_file(path: &Path, key: &SymmetricKey) -> Result<PendingKeyFile, KeyError> {
    let io_err = |source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::Builder::new()
        .prefix(".anonflux-key-")
        .tempfile_in(dir)
        .map_err(io_err)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(fs::Permissions::from_mode(KEY_FILE_MODE))
            .map_err(io_err)?;
    }
    file.write_all(key.as_bytes()).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;

    debug!(path = %path.display(), staged = %file.path().display(), "encryption key staged");
    Ok(PendingKeyFile {
        file,
        path: path.to_path_buf(),
    })
}

impl PendingKeyFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn staged_path(&self) -> &Path {
        self.file.path()
    }

    /// Atomically replaces the key at [`path`](Self::path) with the staged key.
    /// If the rename fails the staged file is kept, since its ciphertext may
    /// already exist.
    pub fn commit(self) -> Result<(), KeyError> {
        let Self { file, path } = self;
        match file.persist(&path) {
            Ok(_) => {
                info!(path = %path.display(), "encryption key written");
                Ok(())
            }
            Err(err) => {
                let source = err.error;
                match err.file.keep() {
                    Ok((_, kept)) => Err(KeyError::Install { path, kept, source }),
                    Err(keep_err) => Err(KeyError::Io {
                        path,
                        source: keep_err.error,
                    }),
                }
            }
        }
    }
}

pub fn read_key_file(path: &Path) -> Result<SymmetricKey, KeyError> {
    let bytes = fs::read(path).map_err(|source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(path) {
            let mode = metadata.permissions().mode() & 0o777;
            if mode & 0o077 != 0 {
                warn!(
                    path = %path.display(),
                    mode = %format!("{mode:o}"),
                    "key file is readable by other users"
                );
            }
        }
    }

    SymmetricKey::from_bytes(&bytes).map_err(|source| KeyError::InvalidLength {
        path: path.to_path_buf(),
        source,
    })
}
