//! Product code and label identity scheme.
//!
//! Three pieces, all free of I/O:
//!
//! - [`generator`]: `(type, name, sequence)` → `GG-BK-GITA-00101`.
//! - [`payload`]: identifiers to and from the one-key JSON carried in QR labels.
//! - [`scanner`]: turns keyboard-wedge scanner input into typed scan events.
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::Instant;
//! use granthalaya_inventory::code::{
//!     encode, generate_code, Key, ProductType, ScanClassifier, ScanKind,
//! };
//!
//! let code = generate_code(ProductType::Book, "Gita", Some(101)).unwrap();
//! assert_eq!(code, "GG-BK-GITA-00101");
//!
//! let qr = encode(ScanKind::Product, &code);
//!
//! let mut scanner = ScanClassifier::default();
//! let now = Instant::now();
//! for ch in qr.chars() {
//!     scanner.handle_key(Key::Char(ch), now);
//! }
//! let event = scanner.handle_key(Key::Enter, now).unwrap();
//! assert_eq!(event.kind, ScanKind::Product);
//! assert_eq!(event.id, code);
//! ```

pub mod generator;
pub mod ident;
pub mod payload;
pub mod scanner;

pub use generator::{
    generate_code, parse_sequence, slugify, CodeError, ProductCode, ProductType, DEFAULT_SEQUENCE,
};
pub use ident::{normalize_rack_id, CODE_PREFIX, ORDER_PREFIX, RACK_PREFIX};
pub use payload::{decode, encode, ScanEvent, ScanKind};
pub use scanner::{classify, Key, ScanClassifier, ScannerConfig};

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    /// Generated code → QR payload → scanned keystrokes → the same code.
    #[test]
    fn label_round_trip_through_scanner() {
        let code = generate_code(ProductType::Samagri, "Panchagavya Kit", Some(12)).unwrap();
        assert_eq!(code, "GG-SM-PANCHAGAVYA-KIT-00012");

        let mut scanner = ScanClassifier::default();
        let mut at = Instant::now();
        for ch in encode(ScanKind::Product, &code).chars() {
            assert!(scanner.handle_key(Key::Char(ch), at).is_none());
            at += Duration::from_millis(3);
        }
        let event = scanner.handle_key(Key::Enter, at).unwrap();
        assert_eq!(event, ScanEvent::new(ScanKind::Product, code.clone()));
        assert_eq!(ProductCode::parse(&event.id).unwrap().to_string(), code);
    }

    /// A printed code scanned as plain text (1D barcode) classifies the same way.
    #[test]
    fn plain_code_scan_matches_qr_scan() {
        let code = generate_code(ProductType::Vastra, "Cotton Dhoti", Some(3)).unwrap();
        let plain = classify(&code.to_lowercase()).unwrap();
        let qr = classify(&encode(ScanKind::Product, &code)).unwrap();
        assert_eq!(plain, qr);
    }

    #[test]
    fn rack_label_round_trip() {
        let rack = normalize_rack_id("b1").unwrap();
        let event = classify(&encode(ScanKind::Rack, &rack)).unwrap();
        assert_eq!(event, ScanEvent::new(ScanKind::Rack, "RACK-B1"));
    }
}
