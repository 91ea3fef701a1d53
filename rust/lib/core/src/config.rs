use std::path::PathBuf;

/// Storage and listen settings shared by the server and the offline commands.
///
/// The binary fills this from its TOML file and command-line flags, then
/// hands it to storage initialization.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Root directory for everything the service persists.
    pub data_dir: Option<PathBuf>,

    /// Path to the redb document store.
    /// Defaults to `{data_dir}/inventory.redb` if not specified.
    pub db_path: Option<PathBuf>,

    /// Directory for blob storage (label sheets).
    /// Defaults to `{data_dir}/blobs/` if not specified.
    pub blob_dir: Option<PathBuf>,

    /// Public base URL blobs are served under, e.g. `https://cdn.example.org/blobs`.
    /// When unset, blob URLs are `file://` URLs into `blob_dir`.
    pub blob_base_url: Option<String>,

    /// Listen address for the HTTP server.
    pub listen: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_path: None,
            blob_dir: None,
            blob_base_url: None,
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Resolve the document store path, falling back to `{data_dir}/inventory.redb`.
    pub fn resolve_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("inventory.redb"))
    }

    /// Resolve the blob storage directory.
    pub fn resolve_blob_dir(&self) -> PathBuf {
        self.blob_dir
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("blobs"))
    }

    fn resolve_data_subpath(&self, name: &str) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(|d| d.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}
