//! Raw spreadsheet input as handed over by the upload layer.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single spreadsheet cell before any interpretation.
///
/// Serializes untagged so JSON payloads from the upload layer map directly:
/// `null`, booleans, numbers and strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawCell {
    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Text rendering of the cell, trimmed. Empty cells render as `""`.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Empty => Cow::Borrowed(""),
            Self::Text(text) => Cow::Borrowed(text.trim()),
            Self::Number(value) => Cow::Owned(format_number(*value)),
            Self::Bool(value) => Cow::Borrowed(if *value { "true" } else { "false" }),
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_string())
        }
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Formats a number without a trailing `.0` for integer values.
///
/// ```
/// use censo_model::raw::format_number;
///
/// assert_eq!(format_number(40.0), "40");
/// assert_eq!(format_number(1.5), "1.5");
/// ```
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// One sheet: a header row somewhere near the top followed by data rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<RawCell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// True when the sheet has no row with at least one non-blank cell.
    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(RawCell::is_blank))
    }
}

/// Upload metadata carried alongside the raw sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    pub file_name: String,
    pub file_size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub sheet_names: Vec<String>,
}

impl DatasetMetadata {
    pub fn new(file_name: impl Into<String>, file_size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            file_size,
            uploaded_at: Utc::now(),
            sheet_names: Vec::new(),
        }
    }
}

/// The immutable input of a run: active personnel and terminations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataset {
    pub active: RawSheet,
    pub terminated: RawSheet,
    pub metadata: DatasetMetadata,
}

impl RawDataset {
    pub fn new(active: RawSheet, terminated: RawSheet, metadata: DatasetMetadata) -> Self {
        Self {
            active,
            terminated,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(RawCell::Empty.is_blank());
        assert!(RawCell::Text("   ".into()).is_blank());
        assert!(!RawCell::Number(0.0).is_blank());
        assert!(!RawCell::Text("x".into()).is_blank());
    }

    #[test]
    fn cells_deserialize_untagged() {
        let cells: Vec<RawCell> = serde_json::from_str(r#"[null, true, 12.5, "RFC"]"#).unwrap();
        assert_eq!(
            cells,
            vec![
                RawCell::Empty,
                RawCell::Bool(true),
                RawCell::Number(12.5),
                RawCell::Text("RFC".into()),
            ]
        );
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(RawCell::Number(43831.0).as_text(), "43831");
        assert_eq!(RawCell::Number(250.75).as_text(), "250.75");
    }

    #[test]
    fn sheet_blank_when_all_rows_blank() {
        let sheet = RawSheet::new("Activos", vec![vec![RawCell::Empty, "  ".into()]]);
        assert!(sheet.is_blank());
        assert!(RawSheet::default().is_blank());
    }
}
