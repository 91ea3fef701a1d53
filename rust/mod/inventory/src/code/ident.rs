//! Identifier prefixes and the rack / order id formats.

use super::generator::CodeError;

/// Prefix of every generated product code.
pub const CODE_PREFIX: &str = "GG-";

/// Prefix of rack identifiers, e.g. `RACK-A3`.
pub const RACK_PREFIX: &str = "RACK-";

/// Prefix of order identifiers, e.g. `ORD-55`.
pub const ORDER_PREFIX: &str = "ORD-";

/// Normalize a rack identifier to `RACK-<LABEL>`.
///
/// Accepts `a3`, `RACK-A3` or ` rack-a3 `; the label must be ASCII
/// letters, digits and inner hyphens.
pub fn normalize_rack_id(raw: &str) -> Result<String, CodeError> {
    let upper = raw.trim().to_ascii_uppercase();
    let label = upper.strip_prefix(RACK_PREFIX).unwrap_or(&upper);

    if label.is_empty() {
        return Err(CodeError::Malformed(raw.to_string(), "rack label is empty"));
    }
    if label.starts_with('-')
        || label.ends_with('-')
        || !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    {
        return Err(CodeError::Malformed(
            raw.to_string(),
            "rack label must be letters, digits and inner hyphens",
        ));
    }

    Ok(format!("{RACK_PREFIX}{label}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rack_ids_are_prefixed_and_upper_cased() {
        assert_eq!(normalize_rack_id("a3").unwrap(), "RACK-A3");
        assert_eq!(normalize_rack_id(" rack-b1 ").unwrap(), "RACK-B1");
        assert_eq!(normalize_rack_id("RACK-EAST-12").unwrap(), "RACK-EAST-12");
    }

    #[test]
    fn bad_rack_ids_are_rejected() {
        for bad in ["", "RACK-", "rack-", "A 3", "-A3", "A3-", "A/3"] {
            assert!(normalize_rack_id(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
