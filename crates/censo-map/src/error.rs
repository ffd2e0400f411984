//! Error types for column mapping.

use censo_model::{CanonicalField, SheetKind};
use thiserror::Error;

/// Structural mapping failures. Data-quality problems are never errors here.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("synonym table entry for {field} is unusable: {reason}")]
    InvalidSynonymTable {
        field: CanonicalField,
        reason: String,
    },
    #[error("{sheet} sheet has {columns} columns, more than the supported {limit}")]
    TooManyColumns {
        sheet: SheetKind,
        columns: usize,
        limit: usize,
    },
    #[error("failed to fingerprint mapped dataset")]
    Fingerprint(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MapError>;
