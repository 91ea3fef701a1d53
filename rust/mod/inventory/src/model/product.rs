use serde::{Deserialize, Serialize};

use crate::code::ProductType;

/// Product: one stock item of the Granthalaya.
///
/// `product_code` is assigned once, when the product is created (or by the
/// backfill migration for records that predate codes), and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Internal id (32 hex chars).
    pub id: String,

    /// Label code, e.g. "GG-BK-GITA-00101". None only for legacy records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,

    #[serde(rename = "type", default)]
    pub product_type: ProductType,

    pub name: String,

    #[serde(default)]
    pub price: f64,

    #[serde(default)]
    pub stock_quantity: i64,

    #[serde(default)]
    pub category: String,

    /// Manufacturer barcode (EAN / ISBN) printed on the item, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,

    /// Rack the item is shelved on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack_id: Option<String>,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub updated_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Product {
    /// Check the fields an admin can edit.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("product name must not be empty".into());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("price {} must be a non-negative number", self.price));
        }
        if self.stock_quantity < 0 {
            return Err(format!("stock quantity {} must not be negative", self.stock_quantity));
        }
        if let Some(barcode) = &self.barcode {
            if barcode.trim().is_empty() {
                return Err("barcode must not be blank".into());
            }
        }
        Ok(())
    }
}

/// Create request. The code is generated, never supplied.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[serde(rename = "type")]
    pub product_type: ProductType,

    pub name: String,

    #[serde(default)]
    pub price: f64,

    #[serde(default)]
    pub stock_quantity: i64,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub barcode: Option<String>,

    /// Explicit sequence for the code. Normally left out so the next
    /// free sequence for the product type is used.
    #[serde(default)]
    pub sequence: Option<u64>,
}

/// Equality filters for product listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    #[serde(rename = "type", default)]
    pub product_type: Option<ProductType>,

    #[serde(default)]
    pub category: Option<String>,

    /// Only products without (true) or with (false) a code.
    #[serde(default)]
    pub missing_code: Option<bool>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(ty) = self.product_type {
            if product.product_type != ty {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !product.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(missing) = self.missing_code {
            if product.product_code.is_none() != missing {
                return false;
            }
        }
        true
    }
}
