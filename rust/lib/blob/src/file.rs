use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::BlobError;
use crate::traits::{BlobMeta, BlobStore};

fn io(e: std::io::Error) -> BlobError {
    BlobError::Io(e.to_string())
}

/// FileStore is a BlobStore backed by the local filesystem.
///
/// Keys map to paths under `base_dir`:
///   key "labels/ab12.json" → `{base_dir}/labels/ab12.json`
///
/// Parent directories are created on `put`. URLs are built from
/// `base_url` when one is configured (the directory is then expected to
/// be served by a static file server), otherwise they are `file://` URLs.
pub struct FileStore {
    base_dir: PathBuf,
    base_url: Option<String>,
}

impl FileStore {
    /// Create a new FileStore rooted at `base_dir`, creating the directory if needed.
    pub fn open(base_dir: &Path) -> Result<Self, BlobError> {
        fs::create_dir_all(base_dir).map_err(io)?;
        let base_dir = base_dir.canonicalize().map_err(io)?;
        Ok(Self {
            base_dir,
            base_url: None,
        })
    }

    /// Serve URLs under `base_url` instead of `file://`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url: String = base_url.into();
        self.base_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Resolve a key to a path under `base_dir`.
    ///
    /// Only plain relative components are allowed, so a key can never
    /// name anything outside the store.
    fn resolve(&self, key: &str) -> Result<PathBuf, BlobError> {
        if key.is_empty() || key.contains('\\') {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        let rel = Path::new(key);
        let all_normal = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !all_normal {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(self.base_dir.join(rel))
    }

    /// Recursively walk `dir`, collecting blobs whose keys match `prefix`.
    fn walk_dir(&self, dir: &Path, prefix: &str, results: &mut Vec<BlobMeta>) -> Result<(), BlobError> {
        if !dir.is_dir() {
            return Ok(());
        }

        for entry in fs::read_dir(dir).map_err(io)? {
            let entry = entry.map_err(io)?;
            let path = entry.path();

            if path.is_dir() {
                self.walk_dir(&path, prefix, results)?;
            } else if path.is_file() {
                let Ok(rel) = path.strip_prefix(&self.base_dir) else {
                    continue;
                };
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(prefix) {
                    let size = entry.metadata().map_err(io)?.len();
                    results.push(BlobMeta { key, size });
                }
            }
        }

        Ok(())
    }
}

impl BlobStore for FileStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io)?;
        }
        fs::write(&path, data).map_err(io)?;
        debug!("blob put {} ({} bytes)", key, data.len());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        let path = self.resolve(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        fs::read(&path).map(Some).map_err(io)
    }

    fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if path.is_file() {
            fs::remove_file(&path).map_err(io)?;
        }
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, BlobError> {
        Ok(self.resolve(key)?.is_file())
    }

    fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, BlobError> {
        let mut results = Vec::new();
        self.walk_dir(&self.base_dir, prefix, &mut results)?;
        results.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(results)
    }

    fn url(&self, key: &str) -> Result<String, BlobError> {
        let path = self.resolve(key)?;
        Ok(match &self.base_url {
            Some(base) => format!("{}/{}", base, key),
            None => format!("file://{}", path.display()),
        })
    }
}
