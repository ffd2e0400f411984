//! Value patterns used to recognize identifier columns by content.

use std::sync::LazyLock;

use censo_model::CanonicalField;
use regex::Regex;

static RFC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-ZÑ&]{3,4}[0-9]{6}[A-Z0-9]{3}$").expect("Invalid RFC regex")
});

static CURP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{4}[0-9]{6}[HMX][A-Z]{5}[A-Z0-9][0-9]$").expect("Invalid CURP regex")
});

/// Fields that can be recognized from their values, most specific first.
pub const SNIFFABLE_FIELDS: [CanonicalField; 2] = [CanonicalField::Curp, CanonicalField::Rfc];

/// True when `value` looks like the national identifier behind `field`.
pub fn matches_identifier(field: CanonicalField, value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-')
        .flat_map(char::to_uppercase)
        .collect();
    match field {
        CanonicalField::Rfc => RFC_PATTERN.is_match(&compact),
        CanonicalField::Curp => CURP_PATTERN.is_match(&compact),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_person_rfc() {
        assert!(matches_identifier(CanonicalField::Rfc, "GOMJ800101AB1"));
        assert!(matches_identifier(CanonicalField::Rfc, "gomj-800101-ab1"));
        assert!(!matches_identifier(CanonicalField::Rfc, "GOMJ8001"));
    }

    #[test]
    fn recognizes_curp() {
        assert!(matches_identifier(CanonicalField::Curp, "GOMJ800101HDFMRN09"));
        assert!(!matches_identifier(CanonicalField::Curp, "GOMJ800101AB1"));
    }

    #[test]
    fn other_fields_never_match() {
        assert!(!matches_identifier(CanonicalField::Nss, "12345678901"));
    }
}
