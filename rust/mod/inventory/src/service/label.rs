use tracing::{info, warn};

use granthalaya_core::{new_id, now_rfc3339, ServiceError};

use crate::code::{encode, ScanKind};
use crate::model::{Label, LabelSheet};

use super::product::canonical_code;
use super::{blob_error, internal, to_json, InventoryService};

const LABEL_DIR: &str = "labels/";

fn sheet_key(sheet_id: &str) -> String {
    format!("{LABEL_DIR}{sheet_id}.json")
}

impl InventoryService {
    /// Build the label manifest for `codes` and hand it to blob storage
    /// for the PDF renderer. Unknown codes fail the whole sheet.
    pub fn create_label_sheet(&self, codes: &[String], actor: Option<&str>) -> Result<LabelSheet, ServiceError> {
        if codes.is_empty() {
            return Err(ServiceError::Validation("a label sheet needs at least one product code".into()));
        }

        let mut labels = Vec::with_capacity(codes.len());
        for raw in codes {
            let code = canonical_code(raw)?;
            let (product, _) = self.product_doc_by_code(&code)?;
            labels.push(Label {
                qr_payload: encode(ScanKind::Product, &code),
                product_code: code,
                title: product.name,
                price: product.price,
            });
        }

        let mut sheet = LabelSheet {
            sheet_id: new_id(),
            labels,
            created_at: now_rfc3339(),
            created_by: actor.map(str::to_string),
            url: None,
        };
        let key = sheet_key(&sheet.sheet_id);
        self.blob.put(&key, &to_json(&sheet)?).map_err(blob_error)?;
        sheet.url = Some(self.blob.url(&key).map_err(blob_error)?);

        info!(sheet_id = %sheet.sheet_id, labels = sheet.labels.len(), "label sheet stored");
        Ok(sheet)
    }

    pub fn get_label_sheet(&self, sheet_id: &str) -> Result<LabelSheet, ServiceError> {
        if sheet_id.is_empty() || !sheet_id.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ServiceError::Validation(format!("invalid label sheet id {sheet_id:?}")));
        }
        let key = sheet_key(sheet_id);
        let data = self
            .blob
            .get(&key)
            .map_err(blob_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("label sheet {sheet_id} not found")))?;
        let mut sheet: LabelSheet = serde_json::from_slice(&data).map_err(internal)?;
        sheet.url = Some(self.blob.url(&key).map_err(blob_error)?);
        Ok(sheet)
    }

    /// Stored label sheets, oldest first.
    pub fn list_label_sheets(&self) -> Result<Vec<LabelSheet>, ServiceError> {
        let mut sheets = Vec::new();
        for meta in self.blob.list(LABEL_DIR).map_err(blob_error)? {
            let Some(data) = self.blob.get(&meta.key).map_err(blob_error)? else {
                continue;
            };
            match serde_json::from_slice::<LabelSheet>(&data) {
                Ok(mut sheet) => {
                    sheet.url = Some(self.blob.url(&meta.key).map_err(blob_error)?);
                    sheets.push(sheet);
                }
                Err(e) => warn!(key = %meta.key, error = %e, "skipping unreadable label sheet"),
            }
        }
        sheets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(sheets)
    }
}
