//! Data model for actuarial employee census validation.
//!
//! Types flow through a run in this order:
//!
//! 1. [`RawDataset`] - two raw 2-D sheets handed over by an upload layer
//! 2. [`MappedDataset`] - canonical records produced by the column mapper
//! 3. [`Finding`] - observations emitted by validator units
//! 4. [`Report`] - aggregated findings plus [`SummaryStatistics`]
//! 5. [`RunSession`] - lifecycle state polled by the caller

pub mod dataset;
pub mod error;
pub mod field;
pub mod finding;
pub mod progress;
pub mod raw;
pub mod record;
pub mod report;
pub mod session;

pub use dataset::{ColumnBinding, MappedDataset, MatchMethod, SheetMapping, UnmappedColumn};
pub use error::{ModelError, Result};
pub use field::{Applicability, CanonicalField, FieldType, SheetKind};
pub use finding::{Finding, FindingStatus, Severity};
pub use progress::{ProgressEvent, ProgressLevel};
pub use raw::{DatasetMetadata, RawCell, RawDataset, RawSheet};
pub use record::{CanonicalRecord, FieldValue};
pub use report::{Report, SummaryStatistics, UnitOutcome, UnitStatus};
pub use session::{RunSession, RunStatus};
