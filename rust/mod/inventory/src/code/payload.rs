//! QR payload codec.
//!
//! Labels carry a one-key JSON object: `{"productCode": "..."}`,
//! `{"rackId": "..."}` or `{"orderId": "..."}`. The key present is the
//! only type discriminator, so decoding checks the keys in a fixed
//! priority order.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a scan identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanKind {
    Product,
    Rack,
    Order,
}

impl ScanKind {
    /// Decode priority: the first key found wins.
    pub const PRIORITY: [ScanKind; 3] = [ScanKind::Product, ScanKind::Rack, ScanKind::Order];

    /// JSON key carrying this kind's identifier in a QR payload.
    pub fn payload_key(self) -> &'static str {
        match self {
            ScanKind::Product => "productCode",
            ScanKind::Rack => "rackId",
            ScanKind::Order => "orderId",
        }
    }
}

impl fmt::Display for ScanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScanKind::Product => "PRODUCT",
            ScanKind::Rack => "RACK",
            ScanKind::Order => "ORDER",
        })
    }
}

/// One decoded scan: what kind of thing, and its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanEvent {
    pub kind: ScanKind,
    pub id: String,
}

impl ScanEvent {
    pub fn new(kind: ScanKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}

/// Encode an identifier as a QR payload.
pub fn encode(kind: ScanKind, id: &str) -> String {
    let mut object = serde_json::Map::with_capacity(1);
    object.insert(kind.payload_key().to_string(), Value::String(id.to_string()));
    Value::Object(object).to_string()
}

/// Decode a QR payload.
///
/// Returns `None` for anything that is not a JSON object carrying one of
/// the recognized keys with a string or numeric value. Malformed input is
/// an expected condition here, not an error.
pub fn decode(payload: &str) -> Option<ScanEvent> {
    let Value::Object(object) = serde_json::from_str::<Value>(payload).ok()? else {
        return None;
    };

    ScanKind::PRIORITY.into_iter().find_map(|kind| {
        let id = match object.get(kind.payload_key())? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(ScanEvent { kind, id })
    })
}
