//! Error types for validator units.

use censo_model::SheetKind;
use thiserror::Error;

/// Unexpected structural failures raised by a validator unit.
///
/// Data-quality problems are reported as findings and never surface here.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("record at row {row} is filed under the wrong sheet (expected {expected})")]
    MisfiledRecord { row: usize, expected: SheetKind },
    #[error("{sheet} records are not in ascending row order near row {row}")]
    UnorderedRows { sheet: SheetKind, row: usize },
    #[error("invalid validation policy: {0}")]
    InvalidPolicy(String),
    #[error("{unit} failed: {reason}")]
    Failed { unit: String, reason: String },
}
