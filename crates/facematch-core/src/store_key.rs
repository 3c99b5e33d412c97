use std::fs;
use std::io::Write;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::errors::{AppError, AppResult};

pub const AES_GCM_KEY_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected {} bytes but found {found}", AES_GCM_KEY_BYTES)]
pub struct KeyLengthError {
    pub found: usize,
}

/// AES-256-GCM key sealing descriptor store files at rest.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreKey {
    bytes: Vec<u8>,
}

impl StoreKey {
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; AES_GCM_KEY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, KeyLengthError> {
        if bytes.len() != AES_GCM_KEY_BYTES {
            return Err(KeyLengthError { found: bytes.len() });
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Reads a key file holding the base64 encoding of the raw key.
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| AppError::StoreRead {
            path: path.to_path_buf(),
            source,
        })?;
        let bytes = general_purpose::STANDARD
            .decode(contents.trim())
            .map_err(|err| AppError::StoreKey {
                path: path.to_path_buf(),
                message: format!("invalid base64: {err}"),
            })?;
        Self::from_bytes(bytes).map_err(|err| AppError::StoreKey {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Writes the key file atomically with owner-only permissions. Refuses to
    /// overwrite an existing key, which would orphan every store sealed with it.
    pub fn persist(&self, path: &Path) -> AppResult<()> {
        if path.exists() {
            return Err(AppError::StoreKey {
                path: path.to_path_buf(),
                message: "refusing to overwrite an existing key file".into(),
            });
        }

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|source| AppError::StoreWrite {
            path: parent.to_path_buf(),
            source,
        })?;
        let mut tmp = NamedTempFile::new_in(parent).map_err(|source| AppError::StoreWrite {
            path: path.to_path_buf(),
            source,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600)).map_err(
                |source| AppError::StoreWrite {
                    path: path.to_path_buf(),
                    source,
                },
            )?;
        }

        writeln!(tmp, "{}", self.to_base64()).map_err(|source| AppError::StoreWrite {
            path: path.to_path_buf(),
            source,
        })?;
        tmp.as_file()
            .sync_all()
            .map_err(|source| AppError::StoreWrite {
                path: path.to_path_buf(),
                source,
            })?;
        tmp.persist_noclobber(path)
            .map_err(|err| AppError::StoreWrite {
                path: path.to_path_buf(),
                source: err.error,
            })?;
        Ok(())
    }
}

impl std::fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoreKey(..)")
    }
}
