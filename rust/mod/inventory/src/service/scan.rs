use serde::Serialize;
use tracing::debug;

use granthalaya_core::ServiceError;

use crate::code::{classify, ScanEvent, ScanKind};
use crate::model::{Product, Rack};

use super::{keys, InventoryService};

/// What a scan turned out to identify.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolvedScan {
    Product { product: Product },
    Rack { rack: Rack },
    /// Orders live in the storefront, not here; the id is handed back as is.
    #[serde(rename_all = "camelCase")]
    Order { order_id: String },
}

impl InventoryService {
    /// Look up the record a classified scan points at.
    ///
    /// Product scans try the code index first and then the barcode index,
    /// so legacy EAN/ISBN stickers keep working.
    pub fn resolve_scan(&self, event: &ScanEvent) -> Result<ResolvedScan, ServiceError> {
        match event.kind {
            ScanKind::Product => {
                let id = event.id.trim().to_uppercase();
                if let Some(product_id) = self.product_id_for_code(&id)? {
                    debug!(code = %id, "scan matched product code");
                    return Ok(ResolvedScan::Product {
                        product: self.get_product(&product_id)?,
                    });
                }
                if let Some(product_id) = self.get_string(&keys::barcode(&id))? {
                    debug!(barcode = %id, "scan matched barcode");
                    return Ok(ResolvedScan::Product {
                        product: self.get_product(&product_id)?,
                    });
                }
                Err(ServiceError::NotFound(format!("no product for scan {id}")))
            }
            ScanKind::Rack => Ok(ResolvedScan::Rack {
                rack: self.get_rack(&event.id)?,
            }),
            ScanKind::Order => Ok(ResolvedScan::Order {
                order_id: event.id.clone(),
            }),
        }
    }

    /// Classify one complete scan (a whole scanner line) and resolve it.
    ///
    /// The length floor counts the raw line without its line ending, the
    /// same buffer the keystroke classifier measures.
    pub fn scan_input(&self, raw: &str) -> Result<ResolvedScan, ServiceError> {
        let raw = raw.trim_end_matches(['\r', '\n']);
        if raw.chars().count() < self.scanner.min_len() {
            return Err(ServiceError::Validation(format!(
                "scan {raw:?} is shorter than {} characters",
                self.scanner.min_len()
            )));
        }
        let event = classify(raw)
            .ok_or_else(|| ServiceError::Validation(format!("unrecognized scan {raw:?}")))?;
        self.resolve_scan(&event)
    }
}
