//! CSV loading into raw census sheets.
//!
//! Cells are kept close to what a spreadsheet export would hand over: empty
//! cells become [`RawCell::Empty`], plain decimal numbers become
//! [`RawCell::Number`] and everything else stays text. Numbers written with
//! a leading zero (`01234567890`) stay text so identifiers keep their digits.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use censo_model::{DatasetMetadata, RawCell, RawDataset, RawSheet};

pub const ACTIVE_SHEET: &str = "Activos";
pub const TERMINATED_SHEET: &str = "Bajas";

/// Reads a CSV file into a sheet named `name`. Non UTF-8 bytes are replaced.
pub fn read_sheet(path: &Path, name: &str) -> Result<RawSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut rows = Vec::new();
    for (index, record) in reader.byte_records().enumerate() {
        let record =
            record.with_context(|| format!("read line {} of {}", index + 1, path.display()))?;
        let row = record
            .iter()
            .map(|field| parse_cell(&String::from_utf8_lossy(field)))
            .collect();
        rows.push(row);
    }
    debug!(path = %path.display(), rows = rows.len(), "loaded sheet");
    Ok(RawSheet::new(name, rows))
}

/// Builds the run input from the active CSV and an optional terminations CSV.
pub fn load_dataset(active: &Path, terminated: Option<&Path>) -> Result<RawDataset> {
    let active_sheet = read_sheet(active, ACTIVE_SHEET)?;
    let terminated_sheet = match terminated {
        Some(path) => read_sheet(path, TERMINATED_SHEET)?,
        None => RawSheet::new(TERMINATED_SHEET, Vec::new()),
    };

    let mut total_size = file_size(active)?;
    if let Some(path) = terminated {
        total_size += file_size(path)?;
    }
    let file_name = active
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| active.display().to_string());
    let mut metadata = DatasetMetadata::new(file_name, total_size);
    metadata.sheet_names = vec![ACTIVE_SHEET.to_string(), TERMINATED_SHEET.to_string()];

    Ok(RawDataset::new(active_sheet, terminated_sheet, metadata))
}

fn file_size(path: &Path) -> Result<u64> {
    Ok(fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len())
}

/// Interprets one CSV field.
pub fn parse_cell(field: &str) -> RawCell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return RawCell::Empty;
    }
    if looks_numeric(trimmed)
        && let Ok(value) = trimmed.parse::<f64>()
        && value.is_finite()
    {
        return RawCell::Number(value);
    }
    RawCell::Text(field.to_string())
}

fn looks_numeric(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut chars = digits.chars();
    let (Some(first), second) = (chars.next(), chars.next()) else {
        return false;
    };
    if first == '0' && second.is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    digits.chars().filter(|c| *c == '.').count() <= 1
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().any(|c| c.is_ascii_digit())
}
