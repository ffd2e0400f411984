//! Duplicated identifiers within a sheet.

use std::collections::BTreeMap;

use serde_json::json;

use censo_model::{
    CanonicalField, CanonicalRecord, Finding, MappedDataset, ProgressLevel, SheetKind,
};

use super::{Findings, sheet_records};
use crate::error::UnitError;
use crate::identity::nss_digits;
use crate::unit::{UnitContext, ValidatorUnit};

/// Comparable form of an identifier; NSS values compare by their digits.
pub(crate) fn identifier_key(record: &CanonicalRecord, field: CanonicalField) -> Option<String> {
    let value = record.identifier(field)?;
    if field == CanonicalField::Nss {
        return Some(nss_digits(&value).unwrap_or(value));
    }
    Some(value)
}

/// Rows per identifier value, for values that occur more than once.
fn repeated_values(records: &[CanonicalRecord], field: CanonicalField) -> BTreeMap<String, Vec<usize>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for record in records {
        if let Some(key) = identifier_key(record, field) {
            groups.entry(key).or_default().push(record.row);
        }
    }
    groups.retain(|_, rows| rows.len() > 1);
    groups
}

pub struct DuplicateDetector;

impl ValidatorUnit for DuplicateDetector {
    fn name(&self) -> &'static str {
        "duplicate_detector"
    }

    fn description(&self) -> &'static str {
        "Detecta identificadores repetidos dentro de cada hoja"
    }

    fn priority(&self) -> u32 {
        16
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["rfc_validator", "curp_validator", "nss_validator"]
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let mut findings = Findings::new(self.name());
        for rule in &ctx.policy().duplicates {
            let field = rule.field;
            for sheet in SheetKind::ALL {
                if !field.applicability().applies_to(sheet)
                    || !dataset.mapping(sheet).is_mapped(field)
                {
                    continue;
                }
                let records = sheet_records(dataset, sheet)?;
                for (value, rows) in repeated_values(records, field) {
                    let count = rows.len();
                    findings.push(
                        Finding::of_severity(
                            self.name(),
                            field.name(),
                            format!(
                                "{} '{value}' repetido {count} veces en {}",
                                field.label(),
                                sheet.label()
                            ),
                            rule.severity,
                        )
                        .with_suggestion("Cada empleado debe aparecer una sola vez por hoja")
                        .with_rows(sheet, rows)
                        .with_metadata(json!({ "value": value, "count": count })),
                    );
                }
            }
        }
        if !findings.is_empty() {
            ctx.progress(ProgressLevel::Info, "Se detectaron identificadores repetidos");
        }
        Ok(findings.finish(CanonicalField::EmployeeId.name(), "Sin identificadores repetidos"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::{active, context, dataset, terminated};
    use censo_model::Severity;

    #[test]
    fn lists_every_row_sharing_a_value() {
        let data = dataset(
            vec![
                active(2, &[(CanonicalField::Curp, "GOMJ800101HDFRRN00")]),
                active(3, &[(CanonicalField::Curp, "PELA800101MDFRNN08")]),
                active(4, &[(CanonicalField::Curp, "gomj800101hdfrrn00")]),
            ],
            vec![],
        );
        let findings = DuplicateDetector.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].rows, vec![2, 4]);
        assert_eq!(findings[0].metadata.as_ref().unwrap()["count"], 2);
    }

    #[test]
    fn payroll_keys_only_warn_and_sheets_are_independent() {
        let data = dataset(
            vec![
                active(2, &[(CanonicalField::EmployeeId, "100")]),
                active(3, &[(CanonicalField::EmployeeId, "100")]),
            ],
            vec![terminated(2, &[(CanonicalField::EmployeeId, "100")])],
        );
        let findings = DuplicateDetector.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].sheet, Some(SheetKind::Active));
    }

    #[test]
    fn unique_values_are_success() {
        let data = dataset(
            vec![
                active(2, &[(CanonicalField::Nss, "12345678903")]),
                active(3, &[(CanonicalField::Nss, "01234567897")]),
            ],
            vec![],
        );
        let findings = DuplicateDetector.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert!(findings[0].rows.is_empty());
    }
}
