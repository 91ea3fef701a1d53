use crate::error::KVError;

/// KVStore is the document store the inventory service persists into.
///
/// Keys are namespaced strings: `inventory:product:{id}`,
/// `inventory:code:{PRODUCT_CODE}`, `inventory:migration:{id}`. Values are
/// opaque bytes (JSON documents in practice).
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair, overwriting any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. No-op if the key does not exist.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Write several pairs in one transaction: all or nothing.
    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError>;

    /// Delete several keys in one transaction: all or nothing.
    fn batch_delete(&self, keys: &[&str]) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns (key, value) pairs sorted by key.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Apply `batch` atomically if and only if every guard in it still holds.
    ///
    /// Returns `Ok(false)` without writing anything when a guard fails.
    /// This is the compare-and-swap primitive: a guard on a key's current
    /// value (or on its absence) makes read-check-write sequences safe
    /// against a concurrent writer.
    fn commit(&self, batch: &WriteBatch) -> Result<bool, KVError>;
}

/// Precondition on one key: its current value must equal `expected`
/// (`None` meaning the key must be absent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub key: String,
    pub expected: Option<Vec<u8>>,
}

/// A set of guards plus the writes and deletes to apply when they hold.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub guards: Vec<Guard>,
    pub puts: Vec<(String, Vec<u8>)>,
    pub deletes: Vec<String>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to be absent at commit time.
    pub fn expect_absent(&mut self, key: impl Into<String>) -> &mut Self {
        self.guards.push(Guard {
            key: key.into(),
            expected: None,
        });
        self
    }

    /// Require `key` to hold exactly `value` (or be absent, for `None`) at commit time.
    pub fn expect_value(&mut self, key: impl Into<String>, value: Option<Vec<u8>>) -> &mut Self {
        self.guards.push(Guard {
            key: key.into(),
            expected: value,
        });
        self
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.puts.push((key.into(), value.into()));
        self
    }

    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.deletes.push(key.into());
        self
    }

    /// Number of keys this batch writes or deletes.
    pub fn write_count(&self) -> usize {
        self.puts.len() + self.deletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.write_count() == 0
    }
}
