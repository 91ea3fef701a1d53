use std::collections::{BTreeMap, HashSet};

use tracing::{info, warn};

use granthalaya_core::{now_rfc3339, ServiceError};
use granthalaya_kv::WriteBatch;

use crate::code::{CodeError, ProductCode, ProductType};
use crate::model::{MigrationLock, MigrationOutcome, Product, PRODUCT_CODE_MIGRATION_ID};

use super::product::parse_counter;
use super::{internal, invalid, keys, storage, to_json, InventoryService};

impl InventoryService {
    /// Lock state of the product-code backfill; never-run reads as pending.
    pub fn get_migration_status(&self) -> Result<MigrationLock, ServiceError> {
        Ok(self
            .get_json(&keys::migration(PRODUCT_CODE_MIGRATION_ID))?
            .unwrap_or_else(|| MigrationLock::pending(PRODUCT_CODE_MIGRATION_ID)))
    }

    /// Give every product that predates codes a code, exactly once.
    ///
    /// Products without a code are taken oldest first; the product at
    /// position `i` gets sequence `i + 1`, bumped past any code already in
    /// use. Every write, the completed lock included, goes into a single
    /// commit guarded on the lock as read at the start: a failed run
    /// leaves the store untouched, and of two concurrent runs only one
    /// can win.
    pub fn run_product_code_backfill(&self, actor: &str) -> Result<MigrationOutcome, ServiceError> {
        let lock_key = keys::migration(PRODUCT_CODE_MIGRATION_ID);
        let lock_raw = self.get_raw(&lock_key)?;
        let lock: MigrationLock = match &lock_raw {
            Some(raw) => serde_json::from_slice(raw).map_err(internal)?,
            None => MigrationLock::pending(PRODUCT_CODE_MIGRATION_ID),
        };
        if lock.completed {
            info!(processed = lock.processed_count, "product code backfill already completed");
            return Ok(MigrationOutcome::AlreadyCompleted {
                processed_count: lock.processed_count,
            });
        }

        let mut pending: Vec<(Product, Vec<u8>)> = self
            .kv
            .scan(keys::PRODUCT_PREFIX)
            .map_err(storage)?
            .into_iter()
            .filter_map(|(key, raw)| match serde_json::from_slice::<Product>(&raw) {
                Ok(product) => Some((product, raw)),
                Err(e) => {
                    warn!(%key, error = %e, "backfill skipping undecodable product");
                    None
                }
            })
            .filter(|(product, _)| product.product_code.is_none())
            .collect();
        pending.sort_by(|(a, _), (b, _)| (&a.created_at, &a.id).cmp(&(&b.created_at, &b.id)));

        let now = now_rfc3339();
        let mut batch = WriteBatch::new();
        let mut assigned: HashSet<String> = HashSet::new();
        let mut highest: BTreeMap<ProductType, u64> = BTreeMap::new();
        let mut processed = 0;
        let mut skipped = 0;

        for (i, (mut product, raw)) in pending.into_iter().enumerate() {
            let mut sequence = i as u64 + 1;
            let code = loop {
                let code = match ProductCode::new(product.product_type, &product.name, sequence) {
                    Ok(code) => code.to_string(),
                    Err(CodeError::EmptySlug(_)) => break None,
                    Err(e) => return Err(invalid(e)),
                };
                if !assigned.contains(&code) && !self.code_taken(&code)? {
                    break Some(code);
                }
                sequence += 1;
            };
            let Some(code) = code else {
                warn!(id = %product.id, name = %product.name, "no code can be built from product name, skipping");
                skipped += 1;
                continue;
            };

            product.product_code = Some(code.clone());
            product.updated_at = now.clone();
            batch
                .expect_value(keys::product(&product.id), Some(raw))
                .expect_absent(keys::code(&code))
                .put(keys::product(&product.id), to_json(&product)?)
                .put(keys::code(&code), product.id.as_bytes());

            let top = highest.entry(product.product_type).or_insert(0);
            *top = (*top).max(sequence);
            assigned.insert(code);
            processed += 1;
        }

        // Keep the per-type counters ahead of every backfilled sequence so
        // new products never collide with migrated ones.
        for (product_type, top) in highest {
            let seq_key = keys::seq(product_type);
            let seq_raw = self.get_raw(&seq_key)?;
            if parse_counter(seq_raw.as_deref())? < top {
                batch.expect_value(&seq_key, seq_raw).put(&seq_key, top.to_string());
            }
        }

        let completed = MigrationLock {
            id: PRODUCT_CODE_MIGRATION_ID.to_string(),
            completed: true,
            processed_count: processed,
            skipped_count: skipped,
            completed_at: Some(now),
            completed_by: Some(actor.to_string()),
        };
        batch
            .expect_value(&lock_key, lock_raw)
            .put(&lock_key, to_json(&completed)?);

        if self.commit(&batch)? {
            info!(processed, skipped, %actor, "product code backfill completed");
            return Ok(MigrationOutcome::Completed { processed, skipped });
        }

        let current = self.get_migration_status()?;
        if current.completed {
            info!("product code backfill finished by a concurrent run");
            return Ok(MigrationOutcome::AlreadyCompleted {
                processed_count: current.processed_count,
            });
        }
        Err(ServiceError::Conflict(
            "products changed while the backfill ran, nothing was written; run it again".into(),
        ))
    }
}
