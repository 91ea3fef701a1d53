use serde::{Deserialize, Serialize};

/// Rack is a physical shelf location in the store room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rack {
    /// "RACK-A3".
    pub rack_id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf: Option<String>,

    /// Codes of the products shelved here, in assignment order.
    #[serde(default)]
    pub product_codes: Vec<String>,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub updated_at: String,
}

impl Rack {
    pub fn holds(&self, product_code: &str) -> bool {
        self.product_codes.iter().any(|c| c == product_code)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRack {
    /// "A3" or "RACK-A3"; normalized on create.
    pub rack_id: String,

    pub name: String,

    #[serde(default)]
    pub section: Option<String>,

    #[serde(default)]
    pub shelf: Option<String>,
}
