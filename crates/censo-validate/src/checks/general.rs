//! Dataset-level sanity across both sheets.

use std::collections::BTreeMap;

use serde_json::json;

use censo_model::{CanonicalField, Finding, MappedDataset, SheetKind};

use super::duplicates::identifier_key;
use super::{Findings, MAX_SAMPLES, sheet_records};
use crate::error::UnitError;
use crate::unit::{UnitContext, ValidatorUnit};

/// Active headcount below which actuarial assumptions lose credibility.
const SMALL_POPULATION: usize = 10;
/// Terminations per active employee above which turnover is unusual.
const HIGH_TURNOVER_RATIO: f64 = 1.0;

pub struct GeneralAnalyst;

impl ValidatorUnit for GeneralAnalyst {
    fn name(&self) -> &'static str {
        "general_analyst"
    }

    fn description(&self) -> &'static str {
        "Revisa la congruencia global entre personal activo y bajas"
    }

    fn priority(&self) -> u32 {
        19
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["duplicate_detector", "termination_analyzer"]
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let active = sheet_records(dataset, SheetKind::Active)?;
        let terminated = sheet_records(dataset, SheetKind::Terminated)?;
        let mut findings = Findings::new(self.name());

        for rule in &ctx.policy().duplicates {
            let field = rule.field;
            if !dataset.mapping(SheetKind::Active).is_mapped(field)
                || !dataset.mapping(SheetKind::Terminated).is_mapped(field)
            {
                continue;
            }
            let mut left: BTreeMap<String, usize> = BTreeMap::new();
            for record in terminated {
                if let Some(key) = identifier_key(record, field) {
                    left.entry(key).or_insert(record.row);
                }
            }
            let mut rows = Vec::new();
            let mut pairs = Vec::new();
            for record in active {
                if let Some(key) = identifier_key(record, field)
                    && let Some(terminated_row) = left.get(&key)
                {
                    rows.push(record.row);
                    if pairs.len() < MAX_SAMPLES {
                        pairs.push(json!({ "value": key, "activeRow": record.row, "terminatedRow": terminated_row }));
                    }
                }
            }
            if rows.is_empty() {
                continue;
            }
            let count = rows.len();
            findings.push(
                Finding::warning(
                    self.name(),
                    field.name(),
                    format!(
                        "{count} {} aparecen tanto en personal activo como en bajas",
                        field.label()
                    ),
                )
                .with_suggestion("Confirme si se trata de recontrataciones o de bajas no depuradas")
                .with_rows(SheetKind::Active, rows)
                .with_metadata(json!({ "count": count, "samples": pairs })),
            );
        }

        if !active.is_empty() && active.len() < SMALL_POPULATION {
            findings.push(Finding::warning(
                self.name(),
                "dataset",
                format!(
                    "Población de {} activos; menor a {SMALL_POPULATION}, la valuación será poco representativa",
                    active.len()
                ),
            ));
        }
        if !active.is_empty() {
            let ratio = terminated.len() as f64 / active.len() as f64;
            if ratio > HIGH_TURNOVER_RATIO {
                findings.push(
                    Finding::info(
                        self.name(),
                        "dataset",
                        format!("Hay {ratio:.1} bajas por cada empleado activo"),
                    )
                    .with_metadata(json!({ "turnoverRatio": ratio })),
                );
            }
        }

        let success = format!(
            "{} activos y {} bajas sin inconsistencias globales",
            active.len(),
            terminated.len()
        );
        Ok(findings.finish(CanonicalField::EmployeeId.name(), success))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::{active, context, dataset, terminated};
    use censo_model::{Severity, SheetKind};

    fn staff(count: usize) -> Vec<censo_model::CanonicalRecord> {
        (0..count)
            .map(|i| active(i + 2, &[(CanonicalField::EmployeeId, &format!("A{i}"))]))
            .collect()
    }

    #[test]
    fn ids_in_both_sheets_warn() {
        let data = dataset(
            staff(12),
            vec![terminated(2, &[(CanonicalField::EmployeeId, "a3")])],
        );
        let findings = GeneralAnalyst.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].sheet, Some(SheetKind::Active));
        assert_eq!(findings[0].rows, vec![5]);
    }

    #[test]
    fn small_population_warns() {
        let findings = GeneralAnalyst
            .validate(&dataset(staff(3), vec![]), &context())
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("Población de 3"));
    }

    #[test]
    fn clean_dataset_is_success() {
        let findings = GeneralAnalyst
            .validate(&dataset(staff(12), vec![]), &context())
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "12 activos y 0 bajas sin inconsistencias globales");
    }
}
