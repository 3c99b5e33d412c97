use std::path::{Path, PathBuf};

use facematch_core::store_key::StoreKey;
use tracing::info;

use crate::errors::AppResult;

#[derive(Debug, Clone)]
pub struct KeygenSummary {
    pub path: PathBuf,
    pub logs: Vec<String>,
}

/// Writes a freshly generated store key to `path`.
pub fn run_keygen(path: &Path) -> AppResult<KeygenSummary> {
    let key = StoreKey::generate();
    key.persist(path)?;
    info!(path = %path.display(), "generated descriptor store key");

    Ok(KeygenSummary {
        path: path.to_path_buf(),
        logs: vec![
            format!("Wrote AES-256-GCM store key to {}", path.display()),
            "Point store_key_file (or --store-key-file) at this file to seal descriptor sets"
                .to_string(),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use tempfile::tempdir;

    #[test]
    fn keygen_writes_loadable_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.key");
        let summary = run_keygen(&path).unwrap();
        assert_eq!(summary.path, path);
        assert!(StoreKey::load(&path).is_ok());
    }

    #[test]
    fn keygen_never_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.key");
        run_keygen(&path).unwrap();
        let before = std::fs::read(&path).unwrap();

        let err = run_keygen(&path).unwrap_err();
        assert!(matches!(err, AppError::StoreKey { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
