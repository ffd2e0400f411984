//! The standard census validator units.
//!
//! Each unit groups the rows sharing one issue into a single finding per
//! sheet, with up to [`MAX_SAMPLES`] offending values in the metadata.

pub mod age;
pub mod birth_date;
pub mod completeness;
pub mod curp;
pub mod duplicates;
pub mod general;
pub mod gender;
pub mod hierarchy;
pub mod hire_date;
pub mod identity;
pub mod integrated_salary;
pub mod nss;
pub mod outliers;
pub mod position;
pub mod rfc;
pub mod salary;
pub mod salary_ceiling;
pub mod settlement;
pub mod termination;

use serde_json::json;

use censo_model::{CanonicalRecord, Finding, MappedDataset, SheetKind};

use crate::error::UnitError;

pub const MAX_SAMPLES: usize = 5;

/// Records of one sheet, checked for the structural guarantees units rely on.
pub(crate) fn sheet_records(
    dataset: &MappedDataset,
    sheet: SheetKind,
) -> Result<&[CanonicalRecord], UnitError> {
    let records = dataset.records(sheet);
    let mut previous = 0;
    for record in records {
        if record.sheet != sheet {
            return Err(UnitError::MisfiledRecord {
                row: record.row,
                expected: sheet,
            });
        }
        if record.row <= previous {
            return Err(UnitError::UnorderedRows {
                sheet,
                row: record.row,
            });
        }
        previous = record.row;
    }
    Ok(records)
}

/// Rows of one sheet that share an issue.
#[derive(Debug, Default)]
pub(crate) struct RowIssues {
    rows: Vec<usize>,
    samples: Vec<String>,
}

impl RowIssues {
    pub fn push(&mut self, row: usize, sample: impl Into<String>) {
        self.rows.push(row);
        if self.samples.len() < MAX_SAMPLES {
            self.samples.push(sample.into());
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Attaches rows and samples to `finding`; `None` when nothing was collected.
    pub fn into_finding(self, sheet: SheetKind, finding: Finding) -> Option<Finding> {
        if self.rows.is_empty() {
            return None;
        }
        let count = self.rows.len();
        Some(
            finding
                .with_rows(sheet, self.rows)
                .with_metadata(json!({ "count": count, "samples": self.samples })),
        )
    }
}

/// Collects a unit's findings; reports success when nothing was found.
pub(crate) struct Findings {
    unit: &'static str,
    findings: Vec<Finding>,
}

impl Findings {
    pub fn new(unit: &'static str) -> Self {
        Self {
            unit,
            findings: Vec::new(),
        }
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn push_opt(&mut self, finding: Option<Finding>) {
        if let Some(finding) = finding {
            self.findings.push(finding);
        }
    }

    pub fn finish(self, field: &str, success_message: impl Into<String>) -> Vec<Finding> {
        if self.findings.is_empty() {
            vec![Finding::success(self.unit, field, success_message)]
        } else {
            self.findings
        }
    }
}

/// "1 registro" / "3 registros".
pub(crate) fn records_phrase(count: usize) -> String {
    if count == 1 {
        "1 registro".to_string()
    } else {
        format!("{count} registros")
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use censo_model::{
        CanonicalField, CanonicalRecord, FieldValue, MappedDataset, RawCell, SheetKind,
        SheetMapping,
    };

    use crate::policy::ValidationPolicy;
    use crate::unit::UnitContext;

    pub fn context() -> UnitContext {
        UnitContext::new(ValidationPolicy::for_valuation(
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        ))
    }

    /// Builds a record from `(field, value)` pairs; date-like fields get raw cells.
    pub fn record(sheet: SheetKind, row: usize, values: &[(CanonicalField, &str)]) -> CanonicalRecord {
        let mut record = CanonicalRecord::new(row, sheet);
        for (field, value) in values {
            let value = match field.field_type() {
                censo_model::FieldType::Number => match value.parse::<f64>() {
                    Ok(number) => FieldValue::Number(number),
                    Err(_) => continue,
                },
                censo_model::FieldType::Date => FieldValue::Date(RawCell::Text(value.to_string())),
                censo_model::FieldType::Mixed => {
                    FieldValue::Mixed(RawCell::Text(value.to_string()))
                }
                censo_model::FieldType::Text => FieldValue::Text(value.to_string()),
            };
            record.values.insert(*field, value);
        }
        record
    }

    pub fn active(row: usize, values: &[(CanonicalField, &str)]) -> CanonicalRecord {
        record(SheetKind::Active, row, values)
    }

    pub fn terminated(row: usize, values: &[(CanonicalField, &str)]) -> CanonicalRecord {
        record(SheetKind::Terminated, row, values)
    }

    /// Dataset whose mappings bind every field present in any record.
    pub fn dataset(active: Vec<CanonicalRecord>, terminated: Vec<CanonicalRecord>) -> MappedDataset {
        MappedDataset {
            active_mapping: mapping(SheetKind::Active, &active),
            terminated_mapping: mapping(SheetKind::Terminated, &terminated),
            active,
            terminated,
            fingerprint: String::new(),
        }
    }

    fn mapping(sheet: SheetKind, records: &[CanonicalRecord]) -> SheetMapping {
        let mut mapping = SheetMapping::empty(sheet);
        let mut fields: Vec<CanonicalField> = records
            .iter()
            .flat_map(|record| record.values.keys().copied())
            .collect();
        fields.sort();
        fields.dedup();
        mapping.header_row = Some(1);
        for (column, field) in fields.into_iter().enumerate() {
            mapping.bindings.push(censo_model::ColumnBinding {
                field,
                column,
                header: field.label().to_string(),
                score: 1.0,
                method: censo_model::MatchMethod::Exact,
                synonym: None,
            });
        }
        mapping
    }
}
