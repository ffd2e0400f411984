//! Canonical per-employee records.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::field::{CanonicalField, SheetKind};
use crate::raw::{RawCell, format_number};

/// A coerced field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    /// Opaque until a validator parses it.
    Date(RawCell),
    /// Date or government identifier, disambiguated by validators.
    Mixed(RawCell),
}

impl FieldValue {
    /// Text rendering regardless of flavor.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text.as_str()),
            Self::Number(value) => Cow::Owned(format_number(*value)),
            Self::Date(cell) | Self::Mixed(cell) => cell.as_text(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Date(RawCell::Number(value)) | Self::Mixed(RawCell::Number(value)) => {
                Some(*value)
            }
            _ => None,
        }
    }

    /// The raw cell behind date and mixed values.
    pub fn as_raw(&self) -> Option<&RawCell> {
        match self {
            Self::Date(cell) | Self::Mixed(cell) => Some(cell),
            _ => None,
        }
    }
}

/// One employee row after column mapping. Validators only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    /// 1-based row number in the source sheet (header rows included).
    pub row: usize,
    pub sheet: SheetKind,
    pub values: BTreeMap<CanonicalField, FieldValue>,
    /// Columns no canonical field claimed, keyed `unmapped_col_<index>`.
    pub unmapped: BTreeMap<String, RawCell>,
}

impl CanonicalRecord {
    pub fn new(row: usize, sheet: SheetKind) -> Self {
        Self {
            row,
            sheet,
            values: BTreeMap::new(),
            unmapped: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: CanonicalField) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    pub fn has(&self, field: CanonicalField) -> bool {
        self.text(field).is_some()
    }

    /// Non-empty trimmed text for the field.
    pub fn text(&self, field: CanonicalField) -> Option<Cow<'_, str>> {
        let value = self.values.get(&field)?.as_text();
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Upper-cased text with inner whitespace removed; used for identifiers.
    pub fn identifier(&self, field: CanonicalField) -> Option<String> {
        self.text(field).map(|value| {
            value
                .chars()
                .filter(|ch| !ch.is_whitespace())
                .flat_map(char::to_uppercase)
                .collect()
        })
    }

    pub fn number(&self, field: CanonicalField) -> Option<f64> {
        self.values.get(&field).and_then(FieldValue::as_number)
    }

    pub fn raw(&self, field: CanonicalField) -> Option<&RawCell> {
        self.values.get(&field).and_then(FieldValue::as_raw)
    }

    /// Synthetic side-table key for an unmapped column.
    pub fn unmapped_key(column: usize) -> String {
        format!("unmapped_col_{column}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_normalizes_case_and_spaces() {
        let mut record = CanonicalRecord::new(2, SheetKind::Active);
        record.values.insert(
            CanonicalField::Rfc,
            FieldValue::Text("gomj 800101 ab1".into()),
        );
        assert_eq!(
            record.identifier(CanonicalField::Rfc).as_deref(),
            Some("GOMJ800101AB1")
        );
    }

    #[test]
    fn blank_text_reads_as_missing() {
        let mut record = CanonicalRecord::new(2, SheetKind::Active);
        record
            .values
            .insert(CanonicalField::FullName, FieldValue::Text(String::new()));
        assert!(!record.has(CanonicalField::FullName));
        assert!(record.text(CanonicalField::Curp).is_none());
    }

    #[test]
    fn date_serial_reads_as_number() {
        let mut record = CanonicalRecord::new(3, SheetKind::Terminated);
        record.values.insert(
            CanonicalField::HireDate,
            FieldValue::Date(RawCell::Number(43831.0)),
        );
        assert_eq!(record.number(CanonicalField::HireDate), Some(43831.0));
        assert_eq!(
            record.raw(CanonicalField::HireDate),
            Some(&RawCell::Number(43831.0))
        );
    }
}
