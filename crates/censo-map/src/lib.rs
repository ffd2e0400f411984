//! Column mapping for employee census spreadsheets.
//!
//! Raw sheets arrive with free-form, usually Spanish, headers. The
//! [`ColumnMapper`] resolves them onto [`censo_model::CanonicalField`]s using
//! a versioned [`FieldSynonymTable`] and converts each data row into a
//! [`censo_model::CanonicalRecord`].

pub mod convert;
pub mod engine;
pub mod error;
pub mod patterns;
pub mod score;
pub mod synonyms;
pub mod utils;

use censo_model::{MappedDataset, RawDataset};

pub use convert::{Coerced, parse_amount};
pub use engine::{ColumnMapper, MapperOptions, fingerprint};
pub use error::{MapError, Result};
pub use score::{HeaderScore, best_score, score_header};
pub use synonyms::{FieldSynonymTable, SYNONYM_TABLE_VERSION};
pub use utils::normalize_text;

/// Maps both sheets of a raw dataset with the bundled synonym table.
pub fn map_dataset(raw: &RawDataset) -> Result<MappedDataset> {
    ColumnMapper::default().map(&raw.active, &raw.terminated)
}
