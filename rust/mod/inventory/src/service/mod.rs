pub mod label;
pub mod migration;
pub mod product;
pub mod rack;
pub mod scan;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use granthalaya_blob::{BlobError, BlobStore};
use granthalaya_core::ServiceError;
use granthalaya_kv::{KVStore, WriteBatch};

use crate::code::{CodeError, ScanClassifier, ScannerConfig};

pub use scan::ResolvedScan;

/// How many times a guarded write is retried after losing a race to
/// another writer before the operation gives up with a conflict.
pub(crate) const MAX_COMMIT_ATTEMPTS: usize = 8;

/// Document store keys.
pub(crate) mod keys {
    use crate::code::ProductType;

    pub const PRODUCT_PREFIX: &str = "inventory:product:";
    pub const CODE_PREFIX: &str = "inventory:code:";
    pub const BARCODE_PREFIX: &str = "inventory:barcode:";
    pub const SEQ_PREFIX: &str = "inventory:seq:";
    pub const RACK_PREFIX: &str = "inventory:rack:";
    pub const MIGRATION_PREFIX: &str = "inventory:migration:";

    /// Code index value left behind by a deleted product. The code stays
    /// taken so printed labels never resolve to a different product.
    pub const RETIRED_CODE: &str = "!retired";

    pub fn product(id: &str) -> String {
        format!("{PRODUCT_PREFIX}{id}")
    }

    pub fn code(code: &str) -> String {
        format!("{CODE_PREFIX}{code}")
    }

    pub fn barcode(barcode: &str) -> String {
        format!("{BARCODE_PREFIX}{barcode}")
    }

    pub fn seq(product_type: ProductType) -> String {
        format!("{SEQ_PREFIX}{}", product_type.code())
    }

    pub fn rack(rack_id: &str) -> String {
        format!("{RACK_PREFIX}{rack_id}")
    }

    pub fn migration(id: &str) -> String {
        format!("{MIGRATION_PREFIX}{id}")
    }
}

/// Inventory service: owns the storage backends and the business rules
/// around product codes, racks, scans, labels and the code backfill.
pub struct InventoryService {
    pub(crate) kv: Arc<dyn KVStore>,
    pub(crate) blob: Arc<dyn BlobStore>,
    pub(crate) scanner: ScannerConfig,
}

impl InventoryService {
    pub fn new(kv: Arc<dyn KVStore>, blob: Arc<dyn BlobStore>) -> Self {
        Self {
            kv,
            blob,
            scanner: ScannerConfig::default(),
        }
    }

    pub fn with_scanner(mut self, scanner: ScannerConfig) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn scanner_config(&self) -> &ScannerConfig {
        &self.scanner
    }

    /// A fresh keystroke classifier using this service's scanner settings.
    pub fn classifier(&self) -> ScanClassifier {
        ScanClassifier::new(self.scanner.clone())
    }

    // ── Storage helpers ──

    pub(crate) fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, ServiceError> {
        self.kv.get(key).map_err(storage)
    }

    /// Read and decode a JSON document, keeping the raw bytes for use as a
    /// commit guard.
    pub(crate) fn get_doc<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<(T, Vec<u8>)>, ServiceError> {
        match self.get_raw(key)? {
            Some(raw) => {
                let doc = serde_json::from_slice(&raw).map_err(internal)?;
                Ok(Some((doc, raw)))
            }
            None => Ok(None),
        }
    }

    pub(crate) fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ServiceError> {
        Ok(self.get_doc(key)?.map(|(doc, _)| doc))
    }

    pub(crate) fn get_string(&self, key: &str) -> Result<Option<String>, ServiceError> {
        match self.get_raw(key)? {
            Some(raw) => String::from_utf8(raw).map(Some).map_err(internal),
            None => Ok(None),
        }
    }

    /// Decode every document under `prefix`. Undecodable records are
    /// logged and left out.
    pub(crate) fn scan_json<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, ServiceError> {
        let entries = self.kv.scan(prefix).map_err(storage)?;
        let mut docs = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match serde_json::from_slice(&value) {
                Ok(doc) => docs.push(doc),
                Err(e) => warn!(%key, error = %e, "skipping undecodable record"),
            }
        }
        Ok(docs)
    }

    pub(crate) fn commit(&self, batch: &WriteBatch) -> Result<bool, ServiceError> {
        self.kv.commit(batch).map_err(storage)
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>, ServiceError> {
    serde_json::to_vec(value).map_err(internal)
}

pub(crate) fn storage<E: std::fmt::Display>(e: E) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

pub(crate) fn internal<E: std::fmt::Display>(e: E) -> ServiceError {
    ServiceError::Internal(e.to_string())
}

pub(crate) fn invalid(e: CodeError) -> ServiceError {
    ServiceError::Validation(e.to_string())
}

pub(crate) fn blob_error(e: BlobError) -> ServiceError {
    match e {
        BlobError::InvalidKey(_) => ServiceError::Validation(e.to_string()),
        BlobError::Io(_) => ServiceError::Storage(e.to_string()),
    }
}
