use serde::{Deserialize, Serialize};

/// Id of the product-code backfill migration.
pub const PRODUCT_CODE_MIGRATION_ID: &str = "product-codes-v1";

/// Persisted gate of a one-time migration. Once `completed` is set the
/// migration never runs again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MigrationLock {
    pub id: String,

    #[serde(default)]
    pub completed: bool,

    /// Products that received a code.
    #[serde(default)]
    pub processed_count: usize,

    /// Products left without a code (name has nothing to slug).
    #[serde(default)]
    pub skipped_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
}

impl MigrationLock {
    /// Lock state for a migration that has never run.
    pub fn pending(id: &str) -> Self {
        Self {
            id: id.to_string(),
            completed: false,
            processed_count: 0,
            skipped_count: 0,
            completed_at: None,
            completed_by: None,
        }
    }
}

/// Result of asking a migration to run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationOutcome {
    /// This call did the work.
    #[serde(rename_all = "camelCase")]
    Completed { processed: usize, skipped: usize },

    /// The lock was already set; nothing was written.
    #[serde(rename_all = "camelCase")]
    AlreadyCompleted { processed_count: usize },
}
