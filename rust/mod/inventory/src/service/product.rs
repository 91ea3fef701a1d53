use serde_json::Value;
use tracing::{debug, info};

use granthalaya_core::{merge_patch, new_id, now_rfc3339, ListParams, ListResult, ServiceError};
use granthalaya_kv::WriteBatch;

use crate::code::{ProductCode, ProductType, DEFAULT_SEQUENCE};
use crate::model::{NewProduct, Product, ProductFilter, Rack};

use super::{internal, invalid, keys, to_json, InventoryService, MAX_COMMIT_ATTEMPTS};

/// Fields a patch may repeat but never change. Rack membership goes
/// through `assign_to_rack`.
const READ_ONLY_FIELDS: [&str; 6] = ["id", "productCode", "type", "rackId", "createdAt", "createdBy"];

/// Barcodes are stored the way the scanner reports them: trimmed, upper-cased.
pub(crate) fn normalize_barcode(raw: &str) -> Option<String> {
    let barcode = raw.trim().to_uppercase();
    (!barcode.is_empty()).then_some(barcode)
}

/// Canonical form of a product code given by a caller.
pub(crate) fn canonical_code(raw: &str) -> Result<String, ServiceError> {
    ProductCode::parse(raw).map(|c| c.to_string()).map_err(invalid)
}

/// Decode a per-type sequence counter. Absent means nothing issued yet.
pub(crate) fn parse_counter(raw: Option<&[u8]>) -> Result<u64, ServiceError> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| ServiceError::Internal("corrupt sequence counter".into()))
}

impl InventoryService {
    /// Create a product and assign its code.
    ///
    /// The sequence comes from the per-type counter unless the caller
    /// pins one. The product, its code index entry, the barcode index
    /// entry and the bumped counter land in one guarded commit, so two
    /// concurrent creates can never end up with the same code.
    pub fn create_product(&self, input: NewProduct, actor: Option<&str>) -> Result<Product, ServiceError> {
        let now = now_rfc3339();
        let mut product = Product {
            id: new_id(),
            product_code: None,
            product_type: input.product_type,
            name: input.name.trim().to_string(),
            price: input.price,
            stock_quantity: input.stock_quantity,
            category: input.category.trim().to_string(),
            barcode: input.barcode.as_deref().and_then(normalize_barcode),
            rack_id: None,
            created_at: now.clone(),
            updated_at: now,
            created_by: actor.map(str::to_string),
        };
        product.validate().map_err(ServiceError::Validation)?;
        ProductCode::new(product.product_type, &product.name, DEFAULT_SEQUENCE).map_err(invalid)?;

        let seq_key = keys::seq(product.product_type);
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            if let Some(barcode) = &product.barcode {
                self.ensure_barcode_free(barcode)?;
            }

            let seq_raw = self.get_raw(&seq_key)?;
            let last = parse_counter(seq_raw.as_deref())?;
            let (code, sequence) = match input.sequence {
                Some(sequence) => {
                    let code = ProductCode::new(product.product_type, &product.name, sequence)
                        .map_err(invalid)?
                        .to_string();
                    if self.code_taken(&code)? {
                        return Err(ServiceError::Conflict(format!("product code {code} is taken")));
                    }
                    (code, sequence)
                }
                None => self.next_free_code(product.product_type, &product.name, last + 1)?,
            };

            product.product_code = Some(code.clone());
            let mut batch = WriteBatch::new();
            batch
                .expect_absent(keys::code(&code))
                .expect_value(&seq_key, seq_raw)
                .put(keys::product(&product.id), to_json(&product)?)
                .put(keys::code(&code), product.id.as_bytes())
                .put(&seq_key, last.max(sequence).to_string());
            if let Some(barcode) = &product.barcode {
                batch
                    .expect_absent(keys::barcode(barcode))
                    .put(keys::barcode(barcode), product.id.as_bytes());
            }

            if self.commit(&batch)? {
                info!(id = %product.id, %code, "product created");
                return Ok(product);
            }
            debug!(%code, attempt, "code allocation lost a race, retrying");
        }

        Err(ServiceError::Conflict(format!(
            "could not allocate a {} code after {MAX_COMMIT_ATTEMPTS} attempts",
            product.product_type
        )))
    }

    /// First code for `(product_type, name)` at or after `start` that no
    /// product holds yet.
    pub(crate) fn next_free_code(
        &self,
        product_type: ProductType,
        name: &str,
        start: u64,
    ) -> Result<(String, u64), ServiceError> {
        let mut sequence = start;
        loop {
            let code = ProductCode::new(product_type, name, sequence).map_err(invalid)?.to_string();
            if !self.code_taken(&code)? {
                return Ok((code, sequence));
            }
            debug!(%code, "code taken, probing next sequence");
            sequence = sequence
                .checked_add(1)
                .ok_or_else(|| ServiceError::Internal("sequence space exhausted".into()))?;
        }
    }

    fn ensure_barcode_free(&self, barcode: &str) -> Result<(), ServiceError> {
        match self.get_string(&keys::barcode(barcode))? {
            Some(owner) => Err(ServiceError::Conflict(format!(
                "barcode {barcode} already belongs to product {owner}"
            ))),
            None => Ok(()),
        }
    }

    pub fn get_product(&self, id: &str) -> Result<Product, ServiceError> {
        self.get_json(&keys::product(id))?
            .ok_or_else(|| ServiceError::NotFound(format!("product {id} not found")))
    }

    /// Look up a product by its code (case-insensitive).
    pub fn get_product_by_code(&self, code: &str) -> Result<Product, ServiceError> {
        let code = canonical_code(code)?;
        Ok(self.product_doc_by_code(&code)?.0)
    }

    /// Look up a product by its manufacturer barcode.
    pub fn find_product_by_barcode(&self, barcode: &str) -> Result<Product, ServiceError> {
        let barcode = normalize_barcode(barcode)
            .ok_or_else(|| ServiceError::Validation("barcode must not be blank".into()))?;
        let id = self
            .get_string(&keys::barcode(&barcode))?
            .ok_or_else(|| ServiceError::NotFound(format!("no product with barcode {barcode}")))?;
        self.get_product(&id)
    }

    /// Id of the product holding `code`, if any. `code` must be canonical.
    pub(crate) fn product_id_for_code(&self, code: &str) -> Result<Option<String>, ServiceError> {
        Ok(self
            .get_string(&keys::code(code))?
            .filter(|id| id.as_str() != keys::RETIRED_CODE))
    }

    /// True when `code` was ever issued, including to a deleted product.
    pub(crate) fn code_taken(&self, code: &str) -> Result<bool, ServiceError> {
        Ok(self.get_raw(&keys::code(code))?.is_some())
    }

    pub(crate) fn product_doc_by_code(&self, code: &str) -> Result<(Product, Vec<u8>), ServiceError> {
        let not_found = || ServiceError::NotFound(format!("product {code} not found"));
        let id = self.product_id_for_code(code)?.ok_or_else(not_found)?;
        self.get_doc(&keys::product(&id))?.ok_or_else(not_found)
    }

    /// List products oldest first. `q` matches name or code, case-insensitively.
    pub fn list_products(
        &self,
        filter: &ProductFilter,
        params: &ListParams,
    ) -> Result<ListResult<Product>, ServiceError> {
        let q = params
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let mut items: Vec<Product> = self
            .scan_json::<Product>(keys::PRODUCT_PREFIX)?
            .into_iter()
            .filter(|p| filter.matches(p))
            .filter(|p| match &q {
                Some(q) => {
                    p.name.to_lowercase().contains(q)
                        || p.product_code.as_deref().is_some_and(|c| c.to_lowercase().contains(q))
                }
                None => true,
            })
            .collect();
        items.sort_by(|a, b| (&a.created_at, &a.id).cmp(&(&b.created_at, &b.id)));

        Ok(params.paginate(items))
    }

    /// Apply a JSON merge patch to a product's editable fields.
    ///
    /// A patch may repeat the current `productCode`, `id` or `type` but
    /// never change them.
    pub fn update_product(&self, code: &str, patch: &Value) -> Result<Product, ServiceError> {
        let Some(fields) = patch.as_object() else {
            return Err(ServiceError::Validation("patch must be a JSON object".into()));
        };
        let code = canonical_code(code)?;
        let (current, raw) = self.product_doc_by_code(&code)?;

        let mut doc = serde_json::to_value(&current).map_err(internal)?;
        let null = Value::Null;
        for field in READ_ONLY_FIELDS {
            if let Some(value) = fields.get(field) {
                if value != doc.get(field).unwrap_or(&null) {
                    return Err(ServiceError::Validation(format!("{field} cannot be changed")));
                }
            }
        }

        merge_patch(&mut doc, patch);
        let mut updated: Product =
            serde_json::from_value(doc).map_err(|e| ServiceError::Validation(e.to_string()))?;
        updated.name = updated.name.trim().to_string();
        updated.barcode = updated.barcode.as_deref().and_then(normalize_barcode);
        updated.updated_at = now_rfc3339();
        updated.validate().map_err(ServiceError::Validation)?;

        let mut batch = WriteBatch::new();
        batch
            .expect_value(keys::product(&current.id), Some(raw))
            .put(keys::product(&updated.id), to_json(&updated)?);
        if updated.barcode != current.barcode {
            if let Some(old) = &current.barcode {
                batch.delete(keys::barcode(old));
            }
            if let Some(new) = &updated.barcode {
                self.ensure_barcode_free(new)?;
                batch
                    .expect_absent(keys::barcode(new))
                    .put(keys::barcode(new), updated.id.as_bytes());
            }
        }

        if !self.commit(&batch)? {
            return Err(ServiceError::Conflict(format!(
                "product {code} was modified concurrently, retry the update"
            )));
        }
        info!(%code, "product updated");
        Ok(updated)
    }

    /// Delete a product, its barcode entry and its rack membership.
    ///
    /// The code index entry is replaced by a tombstone, so the code is
    /// never issued again.
    pub fn delete_product(&self, code: &str) -> Result<(), ServiceError> {
        let code = canonical_code(code)?;
        let (product, raw) = self.product_doc_by_code(&code)?;

        let mut batch = WriteBatch::new();
        batch
            .expect_value(keys::product(&product.id), Some(raw))
            .delete(keys::product(&product.id))
            .put(keys::code(&code), keys::RETIRED_CODE);
        if let Some(barcode) = &product.barcode {
            batch.delete(keys::barcode(barcode));
        }
        if let Some(rack_id) = &product.rack_id {
            if let Some((mut rack, rack_raw)) = self.get_doc::<Rack>(&keys::rack(rack_id))? {
                rack.product_codes.retain(|c| c != &code);
                rack.updated_at = now_rfc3339();
                batch
                    .expect_value(keys::rack(rack_id), Some(rack_raw))
                    .put(keys::rack(rack_id), to_json(&rack)?);
            }
        }

        if !self.commit(&batch)? {
            return Err(ServiceError::Conflict(format!(
                "product {code} was modified concurrently, retry the delete"
            )));
        }
        info!(%code, id = %product.id, "product deleted");
        Ok(())
    }
}
