use serde::{Deserialize, Serialize};

/// One printable label: what the PDF renderer lays out for a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub product_code: String,
    /// JSON text to burn into the QR symbol.
    pub qr_payload: String,
    pub title: String,
    pub price: f64,
}

/// A batch of labels handed to the renderer, stored in blob storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSheet {
    pub sheet_id: String,
    pub labels: Vec<Label>,
    pub created_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    /// Where the stored sheet can be fetched. Filled in on read, not stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
