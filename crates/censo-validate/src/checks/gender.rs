//! Gender codes and agreement with the CURP.
//!
//! "M" is ambiguous: masculino in M/F columns, mujer in H/M columns. A column
//! that uses "H" anywhere is read with the H/M convention.

use serde_json::json;

use censo_model::{CanonicalField, CanonicalRecord, Finding, MappedDataset, SheetKind};

use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::identity::{Sex, curp_sex};
use crate::unit::{UnitContext, ValidatorUnit};
use crate::util::{match_label, normalize_label};

const FIELD: CanonicalField = CanonicalField::Gender;

const UNAMBIGUOUS: &[(&str, Sex)] = &[
    ("masculino", Sex::Male),
    ("hombre", Sex::Male),
    ("male", Sex::Male),
    ("h", Sex::Male),
    ("varon", Sex::Male),
    ("femenino", Sex::Female),
    ("mujer", Sex::Female),
    ("female", Sex::Female),
    ("f", Sex::Female),
    ("fem", Sex::Female),
    ("masc", Sex::Male),
];

/// Reads a gender cell; `hm_convention` decides what a bare "M" means.
pub fn parse_sex(text: &str, hm_convention: bool) -> Option<Sex> {
    let normalized = normalize_label(text);
    match normalized.as_str() {
        "m" if hm_convention => Some(Sex::Female),
        "m" => Some(Sex::Male),
        "1" => Some(Sex::Male),
        "2" => Some(Sex::Female),
        _ => match_label(&normalized, UNAMBIGUOUS),
    }
}

fn uses_hm_convention(records: &[CanonicalRecord]) -> bool {
    records.iter().any(|record| {
        record
            .text(FIELD)
            .is_some_and(|text| normalize_label(&text) == "h")
    })
}

pub struct GenderValidator;

impl ValidatorUnit for GenderValidator {
    fn name(&self) -> &'static str {
        "gender_validator"
    }

    fn description(&self) -> &'static str {
        "Normaliza el sexo a hombre/mujer y lo compara con la CURP"
    }

    fn priority(&self) -> u32 {
        9
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["curp_validator"]
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        _ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let mut findings = Findings::new(self.name());
        for sheet in SheetKind::ALL {
            if !dataset.mapping(sheet).is_mapped(FIELD) {
                continue;
            }
            let records = sheet_records(dataset, sheet)?;
            let hm_convention = uses_hm_convention(records);
            let mut unknown = RowIssues::default();
            let mut curp_mismatch = RowIssues::default();
            let mut males = 0usize;
            let mut females = 0usize;

            for record in records {
                let Some(text) = record.text(FIELD) else {
                    continue;
                };
                let Some(sex) = parse_sex(&text, hm_convention) else {
                    unknown.push(record.row, text.into_owned());
                    continue;
                };
                match sex {
                    Sex::Male => males += 1,
                    Sex::Female => females += 1,
                }
                if let Some(from_curp) = record
                    .identifier(CanonicalField::Curp)
                    .and_then(|curp| curp_sex(&curp))
                    && from_curp != sex
                {
                    curp_mismatch.push(
                        record.row,
                        format!("{} vs CURP {}", sex.label(), from_curp.label()),
                    );
                }
            }

            let count = unknown.len();
            findings.push_opt(unknown.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con sexo no reconocido en {}", records_phrase(count), sheet.label()),
                )
                .with_suggestion("Use H/M o Masculino/Femenino"),
            ));
            let count = curp_mismatch.len();
            findings.push_opt(curp_mismatch.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} cuyo sexo no coincide con la CURP en {}", records_phrase(count), sheet.label()),
                ),
            ));
            if sheet == SheetKind::Active && findings.is_empty() && males + females > 0 {
                findings.push(
                    Finding::success(
                        self.name(),
                        FIELD.name(),
                        format!("Sexo válido: {males} hombres y {females} mujeres"),
                    )
                    .with_metadata(json!({ "male": males, "female": females })),
                );
            }
        }
        Ok(findings.finish(FIELD.name(), "Todos los valores de sexo son válidos"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::{active, context, dataset};
    use censo_model::FindingStatus;

    #[test]
    fn m_depends_on_column_convention() {
        assert_eq!(parse_sex("M", false), Some(Sex::Male));
        assert_eq!(parse_sex("M", true), Some(Sex::Female));
        assert_eq!(parse_sex("Femenino", false), Some(Sex::Female));
        assert_eq!(parse_sex("x", false), None);
    }

    #[test]
    fn counts_and_curp_agreement() {
        let data = dataset(
            vec![
                active(2, &[(FIELD, "H"), (CanonicalField::Curp, "GOMJ800101HDFRRN00")]),
                active(3, &[(FIELD, "M"), (CanonicalField::Curp, "PELA800101MDFRNN08")]),
            ],
            vec![],
        );
        let findings = GenderValidator.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].status, FindingStatus::Success);
        assert!(findings[0].message.contains("1 hombres y 1 mujeres"));
    }

    #[test]
    fn flags_unknown_and_mismatch() {
        let data = dataset(
            vec![
                active(2, &[(FIELD, "F"), (CanonicalField::Curp, "GOMJ800101HDFRRN00")]),
                active(3, &[(FIELD, "otro")]),
            ],
            vec![],
        );
        let findings = GenderValidator.validate(&data, &context()).unwrap();
        assert_eq!(findings[0].rows, vec![3]);
        assert_eq!(findings[1].rows, vec![2]);
    }
}
