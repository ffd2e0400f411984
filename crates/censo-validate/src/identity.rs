//! Mexican personal identifiers: RFC, CURP and NSS.
//!
//! RFC and CURP embed the holder's birth date (`YYMMDD`), which is how a
//! census without a birth-date column can still be valued.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use censo_model::{CanonicalField, CanonicalRecord};

use crate::util::{date_from_yymmdd, parse_date};

static RFC_PERSON_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-ZÑ&]{4}(\d{6})[A-Z0-9]{3}$").expect("Invalid person RFC regex")
});

static RFC_COMPANY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-ZÑ&]{3}(\d{6})[A-Z0-9]{3}$").expect("Invalid company RFC regex")
});

static RFC_SHORT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-ZÑ&]{4}(\d{6})$").expect("Invalid short RFC regex"));

static CURP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{4}(\d{6})([HMX])([A-Z]{2})[A-Z]{3}([A-Z0-9])(\d)$")
        .expect("Invalid CURP regex")
});

/// Generic RFCs issued for anonymous domestic and foreign taxpayers.
pub const GENERIC_RFCS: [&str; 2] = ["XAXX010101000", "XEXX010101000"];

/// Two-letter state codes valid in position 12-13 of a CURP ("NE" = born abroad).
const CURP_STATES: &[&str] = &[
    "AS", "BC", "BS", "CC", "CL", "CM", "CS", "CH", "DF", "DG", "GT", "GR", "HG", "JC", "MC", "MN",
    "MS", "NT", "NL", "OC", "PL", "QT", "QR", "SP", "SL", "SR", "TC", "TS", "TL", "VZ", "YN", "ZS",
    "NE",
];

const CURP_ALPHABET: &str = "0123456789ABCDEFGHIJKLMNÑOPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfcKind {
    Person,
    /// Ten-character person RFC with the homoclave missing.
    PersonWithoutHomoclave,
    Company,
}

pub fn classify_rfc(rfc: &str) -> Option<RfcKind> {
    if RFC_PERSON_REGEX.is_match(rfc) {
        Some(RfcKind::Person)
    } else if RFC_SHORT_REGEX.is_match(rfc) {
        Some(RfcKind::PersonWithoutHomoclave)
    } else if RFC_COMPANY_REGEX.is_match(rfc) {
        Some(RfcKind::Company)
    } else {
        None
    }
}

/// Date embedded in an RFC, with the century inferred against `reference`.
pub fn rfc_date(rfc: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let captures = RFC_PERSON_REGEX
        .captures(rfc)
        .or_else(|| RFC_SHORT_REGEX.captures(rfc))
        .or_else(|| RFC_COMPANY_REGEX.captures(rfc))?;
    date_from_yymmdd(captures.get(1)?.as_str(), None, reference)
}

/// First ten characters, the part RFC and CURP share.
pub fn identity_stem(value: &str) -> Option<String> {
    let stem: String = value.chars().take(10).collect();
    (stem.chars().count() == 10).then_some(stem)
}

pub fn is_curp_format(curp: &str) -> bool {
    CURP_REGEX.is_match(curp)
}

/// Birth date in a CURP; the 17th character tells the century.
pub fn curp_date(curp: &str) -> Option<NaiveDate> {
    let captures = CURP_REGEX.captures(curp)?;
    let differentiator = captures.get(4)?.as_str().chars().next()?;
    let century = if differentiator.is_ascii_digit() {
        1900
    } else {
        2000
    };
    let digits = captures.get(1)?.as_str();
    date_from_yymmdd(digits, Some(century), NaiveDate::MAX)
}

pub fn curp_sex(curp: &str) -> Option<Sex> {
    let captures = CURP_REGEX.captures(curp)?;
    match captures.get(2)?.as_str() {
        "H" => Some(Sex::Male),
        "M" => Some(Sex::Female),
        _ => None,
    }
}

pub fn curp_state(curp: &str) -> Option<&str> {
    CURP_REGEX.captures(curp)?.get(3).map(|m| m.as_str())
}

pub fn is_known_state(code: &str) -> bool {
    CURP_STATES.contains(&code)
}

/// Check digit computed from the first 17 characters.
///
/// ```
/// use censo_validate::identity::curp_check_digit;
///
/// assert_eq!(curp_check_digit("GOMJ800101HDFRRN00"), Some(0));
/// ```
pub fn curp_check_digit(curp: &str) -> Option<u32> {
    let chars: Vec<char> = curp.chars().collect();
    if chars.len() != 18 {
        return None;
    }
    let mut sum = 0u32;
    for (index, ch) in chars.iter().take(17).enumerate() {
        let value = CURP_ALPHABET.chars().position(|c| c == *ch)? as u32;
        sum += value * (18 - index as u32);
    }
    Some((10 - sum % 10) % 10)
}

pub fn has_valid_curp_check_digit(curp: &str) -> bool {
    let declared = curp.chars().last().and_then(|c| c.to_digit(10));
    declared.is_some() && declared == curp_check_digit(curp)
}

/// Digits of an NSS with separators removed.
pub fn nss_digits(value: &str) -> Option<String> {
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, '-' | ' ' | '.' | '/'))
        .collect();
    digits.chars().all(|c| c.is_ascii_digit()).then_some(digits)
}

/// Luhn check over an 11-digit NSS.
///
/// ```
/// use censo_validate::identity::is_valid_nss;
///
/// assert!(is_valid_nss("12345678903"));
/// assert!(!is_valid_nss("12345678904"));
/// ```
pub fn is_valid_nss(digits: &str) -> bool {
    if digits.len() != 11 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(position, digit)| {
            if position % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    sum % 10 == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "hombre",
            Self::Female => "mujer",
        }
    }
}

/// Where a record's birth date came from.
#[derive(Debug, Clone, PartialEq)]
pub enum BirthDate {
    /// Parsed from the birth-date column.
    Column(NaiveDate),
    /// The birth-date column held an RFC or CURP instead of a date.
    EmbeddedInColumn(NaiveDate),
    /// Taken from the CURP or RFC column. `unusable` keeps the text of a
    /// birth-date cell that could not be read, if there was one.
    Extracted {
        date: NaiveDate,
        from: CanonicalField,
        unusable: Option<String>,
    },
    /// Birth-date cell present but unreadable and no identifier to fall back on.
    Unparseable(String),
    Missing,
}

impl BirthDate {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Column(date) | Self::EmbeddedInColumn(date) => Some(*date),
            Self::Extracted { date, .. } => Some(*date),
            Self::Unparseable(_) | Self::Missing => None,
        }
    }
}

/// Resolves a record's birth date, falling back to CURP then RFC.
pub fn resolve_birth_date(record: &CanonicalRecord, reference: NaiveDate) -> BirthDate {
    let mut unusable = None;
    if let Some(raw) = record.raw(CanonicalField::BirthDate) {
        if let Some(date) = parse_date(raw) {
            return BirthDate::Column(date);
        }
        if let Some(identifier) = record.identifier(CanonicalField::BirthDate) {
            if let Some(date) = curp_date(&identifier).or_else(|| rfc_date(&identifier, reference))
            {
                return BirthDate::EmbeddedInColumn(date);
            }
            unusable = Some(raw.as_text().into_owned());
        }
    }
    if let Some(date) = record
        .identifier(CanonicalField::Curp)
        .and_then(|curp| curp_date(&curp))
    {
        return BirthDate::Extracted {
            date,
            from: CanonicalField::Curp,
            unusable,
        };
    }
    if let Some(date) = record
        .identifier(CanonicalField::Rfc)
        .filter(|rfc| {
            matches!(
                classify_rfc(rfc),
                Some(RfcKind::Person | RfcKind::PersonWithoutHomoclave)
            )
        })
        .and_then(|rfc| rfc_date(&rfc, reference))
    {
        return BirthDate::Extracted {
            date,
            from: CanonicalField::Rfc,
            unusable,
        };
    }
    match unusable {
        Some(text) => BirthDate::Unparseable(text),
        None => BirthDate::Missing,
    }
}
