//! Product code generator.
//!
//! A product code is `GG-{TYPE}-{SLUG}-{SEQUENCE}`, e.g. `GG-BK-GITA-00101`:
//! a fixed prefix, the two-letter product type, an upper-cased slug of the
//! product name (at most 15 characters) and a zero-padded sequence. Codes
//! are printed on fixed-size labels, so for sequences below 100000 a code
//! is never longer than 28 characters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ident::CODE_PREFIX;

/// Maximum number of characters kept from the slugified name.
pub const MAX_SLUG_LEN: usize = 15;

/// Minimum width of the sequence field. Larger sequences widen it.
pub const SEQUENCE_WIDTH: usize = 5;

/// Sequence used when the caller does not supply one.
pub const DEFAULT_SEQUENCE: u64 = 1;

/// Product categories stocked by the Granthalaya, each with a fixed
/// two-letter code used inside product codes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Book,
    Samagri,
    Gobar,
    Vastra,
    Incense,
    #[default]
    Other,
}

impl ProductType {
    pub const ALL: [ProductType; 6] = [
        ProductType::Book,
        ProductType::Samagri,
        ProductType::Gobar,
        ProductType::Vastra,
        ProductType::Incense,
        ProductType::Other,
    ];

    /// Two-letter code embedded in product codes.
    pub fn code(self) -> &'static str {
        match self {
            ProductType::Book => "BK",
            ProductType::Samagri => "SM",
            ProductType::Gobar => "GB",
            ProductType::Vastra => "VS",
            ProductType::Incense => "IN",
            ProductType::Other => "OT",
        }
    }

    /// Upper-case type name as stored in documents.
    pub fn as_str(self) -> &'static str {
        match self {
            ProductType::Book => "BOOK",
            ProductType::Samagri => "SAMAGRI",
            ProductType::Gobar => "GOBAR",
            ProductType::Vastra => "VASTRA",
            ProductType::Incense => "INCENSE",
            ProductType::Other => "OTHER",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = CodeError;

    /// Accepts the type name (`book`, `BOOK`) or its two-letter code (`BK`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .or_else(|| Self::from_code(s))
            .ok_or_else(|| CodeError::UnknownType(s.to_string()))
    }
}

/// Errors from generating or parsing product codes and identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    #[error("name {0:?} has no ASCII letters or digits to build a code from")]
    EmptySlug(String),

    #[error("sequence {0:?} is not a non-negative integer")]
    InvalidSequence(String),

    #[error("unknown product type {0:?}")]
    UnknownType(String),

    #[error("malformed identifier {0:?}: {1}")]
    Malformed(String, &'static str),
}

/// Derive a label-safe slug from a display name.
///
/// Lower-cases, turns every run of characters other than ASCII letters and
/// digits into one hyphen, drops leading and trailing hyphens and keeps at
/// most [`MAX_SLUG_LEN`] characters. A hyphen exposed by the cut is dropped
/// too, so the result never ends in `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len().min(MAX_SLUG_LEN * 2));
    let mut pending_hyphen = false;

    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    // ASCII only from here on, so byte truncation is char truncation.
    slug.truncate(MAX_SLUG_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Parse a sequence given as a numeric string (form fields, CSV imports).
pub fn parse_sequence(raw: &str) -> Result<u64, CodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodeError::InvalidSequence(raw.to_string()));
    }
    trimmed
        .parse()
        .map_err(|_| CodeError::InvalidSequence(raw.to_string()))
}

/// Generate the product code for `(product_type, name, sequence)`.
///
/// Pure and deterministic. Uniqueness is not checked here: the store
/// guards the code index when the product is persisted.
pub fn generate_code(
    product_type: ProductType,
    name: &str,
    sequence: Option<u64>,
) -> Result<String, CodeError> {
    ProductCode::new(product_type, name, sequence.unwrap_or(DEFAULT_SEQUENCE))
        .map(|code| code.to_string())
}

/// A parsed product code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductCode {
    pub product_type: ProductType,
    /// Upper-cased slug segment.
    pub slug: String,
    pub sequence: u64,
}

impl ProductCode {
    pub fn new(product_type: ProductType, name: &str, sequence: u64) -> Result<Self, CodeError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(CodeError::EmptySlug(name.to_string()));
        }
        Ok(Self {
            product_type,
            slug: slug.to_ascii_uppercase(),
            sequence,
        })
    }

    /// Parse a code such as `GG-BK-GITA-00101` (case-insensitive).
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        let code = raw.trim().to_ascii_uppercase();
        let malformed = |why| CodeError::Malformed(raw.to_string(), why);

        let rest = code
            .strip_prefix(CODE_PREFIX)
            .ok_or_else(|| malformed("missing GG- prefix"))?;
        let (type_code, rest) = rest
            .split_once('-')
            .ok_or_else(|| malformed("missing type segment"))?;
        let product_type =
            ProductType::from_code(type_code).ok_or_else(|| malformed("unknown type code"))?;
        let (slug, digits) = rest
            .rsplit_once('-')
            .ok_or_else(|| malformed("missing sequence segment"))?;

        if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
            return Err(malformed("slug must be 1 to 15 characters"));
        }
        if slug.starts_with('-')
            || slug.ends_with('-')
            || slug.contains("--")
            || !slug.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(malformed("slug must be letters and digits separated by single hyphens"));
        }

        if digits.len() < SEQUENCE_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("sequence must be at least 5 digits"));
        }
        let sequence: u64 = digits.parse().map_err(|_| malformed("sequence out of range"))?;
        if format!("{:0width$}", sequence, width = SEQUENCE_WIDTH) != digits {
            return Err(malformed("sequence is not canonically padded"));
        }

        Ok(Self {
            product_type,
            slug: slug.to_string(),
            sequence,
        })
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}-{}-{:0width$}",
            CODE_PREFIX,
            self.product_type.code(),
            self.slug,
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

impl FromStr for ProductCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_documented_format() {
        assert_eq!(
            generate_code(ProductType::Book, "Gita", Some(101)).unwrap(),
            "GG-BK-GITA-00101"
        );
        assert_eq!(
            generate_code(ProductType::Incense, "Sandal Wood Agarbatti", Some(7)).unwrap(),
            "GG-IN-SANDAL-WOOD-AGA-00007"
        );
    }

    #[test]
    fn type_codes_are_fixed() {
        let codes: Vec<&str> = ProductType::ALL.iter().map(|t| t.code()).collect();
        assert_eq!(codes, vec!["BK", "SM", "GB", "VS", "IN", "OT"]);
    }

    #[test]
    fn deterministic_for_identical_input() {
        for ty in ProductType::ALL {
            let a = generate_code(ty, "Shrimad Bhagavatam, Canto 1", Some(42)).unwrap();
            let b = generate_code(ty, "Shrimad Bhagavatam, Canto 1", Some(42)).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn default_type_is_other() {
        assert_eq!(ProductType::default(), ProductType::Other);
        assert_eq!(ProductType::default().code(), "OT");
    }

    #[test]
    fn sequence_defaults_when_omitted() {
        assert_eq!(generate_code(ProductType::Gobar, "Diya", None).unwrap(), "GG-GB-DIYA-00001");
    }

    #[test]
    fn large_sequence_widens_instead_of_truncating() {
        assert_eq!(
            generate_code(ProductType::Book, "Gita", Some(123_456)).unwrap(),
            "GG-BK-GITA-123456"
        );
    }

    #[test]
    fn code_length_is_bounded() {
        let code = generate_code(
            ProductType::Vastra,
            "An extraordinarily long cotton dhoti name for testing",
            Some(99_999),
        )
        .unwrap();
        assert!(code.len() <= 28, "{code} is {} chars", code.len());
    }

    #[test]
    fn slug_collapses_runs_and_trims() {
        assert_eq!(slugify("  Ramayana -- (Hindi)  "), "ramayana-hindi");
        assert_eq!(slugify("---Tulsi***Mala!!!"), "tulsi-mala");
        assert_eq!(slugify("Ghee"), "ghee");
    }

    #[test]
    fn slug_never_ends_with_hyphen_after_truncation() {
        // "abcdefghijklmn-" would be the 15-char cut.
        assert_eq!(slugify("abcdefghijklmn opq"), "abcdefghijklmn");
    }

    #[test]
    fn slug_character_set_property() {
        let names = [
            "Bhagavad Gītā As It Is",
            "Kumkum / Roli (100g)",
            "  leading and trailing  ",
            "UPPER lower 123",
            "a--b__c..d",
            "गीता Gita 2nd edition",
            "x",
        ];
        for name in names {
            let slug = slugify(name);
            assert!(slug.len() <= MAX_SLUG_LEN, "{slug:?}");
            assert!(!slug.starts_with('-') && !slug.ends_with('-'), "{slug:?}");
            assert!(!slug.contains("--"), "{slug:?}");
            assert!(
                slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'),
                "{slug:?}"
            );
        }
    }

    #[test]
    fn empty_slug_is_rejected() {
        assert_eq!(
            generate_code(ProductType::Book, "गीता", None),
            Err(CodeError::EmptySlug("गीता".into()))
        );
        assert!(matches!(
            generate_code(ProductType::Other, "  ***  ", None),
            Err(CodeError::EmptySlug(_))
        ));
    }

    #[test]
    fn parse_sequence_accepts_numeric_strings() {
        assert_eq!(parse_sequence("00101").unwrap(), 101);
        assert_eq!(parse_sequence(" 7 ").unwrap(), 7);
        assert!(parse_sequence("").is_err());
        assert!(parse_sequence("-3").is_err());
        assert!(parse_sequence("12a").is_err());
    }

    #[test]
    fn product_type_parses_names_and_codes() {
        assert_eq!("book".parse::<ProductType>().unwrap(), ProductType::Book);
        assert_eq!("SM".parse::<ProductType>().unwrap(), ProductType::Samagri);
        assert_eq!(" Incense ".parse::<ProductType>().unwrap(), ProductType::Incense);
        assert!(matches!("murti".parse::<ProductType>(), Err(CodeError::UnknownType(_))));
    }

    #[test]
    fn product_type_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&ProductType::Samagri).unwrap(), "\"SAMAGRI\"");
        let ty: ProductType = serde_json::from_str("\"GOBAR\"").unwrap();
        assert_eq!(ty, ProductType::Gobar);
    }

    #[test]
    fn parse_code_back_into_parts() {
        let code = ProductCode::parse("gg-bk-gita-00101").unwrap();
        assert_eq!(code.product_type, ProductType::Book);
        assert_eq!(code.slug, "GITA");
        assert_eq!(code.sequence, 101);
        assert_eq!(code.to_string(), "GG-BK-GITA-00101");

        let wide = ProductCode::parse("GG-SM-PUJA-KIT-123456").unwrap();
        assert_eq!(wide.slug, "PUJA-KIT");
        assert_eq!(wide.sequence, 123_456);
    }

    #[test]
    fn parse_code_rejects_malformed() {
        for bad in [
            "BK-GITA-00101",
            "GG-XX-GITA-00101",
            "GG-BK-00101",
            "GG-BK--00101",
            "GG-BK-GITA-101",
            "GG-BK-GITA-000101",
            "GG-BK-GI_TA-00101",
            "GG-BK-ABCDEFGHIJKLMNOP-00001",
            "9780131103627",
        ] {
            assert!(ProductCode::parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn generated_codes_parse() {
        for ty in ProductType::ALL {
            let code = generate_code(ty, "Navadvipa Dham Mahatmya", Some(31)).unwrap();
            let parsed: ProductCode = code.parse().unwrap();
            assert_eq!(parsed.product_type, ty);
            assert_eq!(parsed.to_string(), code);
        }
    }
}
