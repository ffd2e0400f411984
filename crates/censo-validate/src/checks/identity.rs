//! Agreement between RFC, CURP and the birth-date column.

use censo_model::{CanonicalField, Finding, MappedDataset, SheetKind};

use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::identity::{BirthDate, curp_date, identity_stem, is_curp_format, resolve_birth_date, rfc_date};
use crate::unit::{UnitContext, ValidatorUnit};

pub struct IdentityConsistency;

impl ValidatorUnit for IdentityConsistency {
    fn name(&self) -> &'static str {
        "identity_consistency"
    }

    fn description(&self) -> &'static str {
        "Compara RFC, CURP y fecha de nacimiento de cada empleado"
    }

    fn priority(&self) -> u32 {
        5
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["rfc_validator", "curp_validator"]
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let mut findings = Findings::new(self.name());
        let reference = ctx.valuation_date();
        for sheet in SheetKind::ALL {
            let mut stem_mismatch = RowIssues::default();
            let mut rfc_date_mismatch = RowIssues::default();
            let mut curp_date_mismatch = RowIssues::default();

            for record in sheet_records(dataset, sheet)? {
                let rfc = record.identifier(CanonicalField::Rfc);
                let curp = record
                    .identifier(CanonicalField::Curp)
                    .filter(|curp| is_curp_format(curp));

                if let (Some(rfc), Some(curp)) = (&rfc, &curp)
                    && let (Some(rfc_stem), Some(curp_stem)) = (identity_stem(rfc), identity_stem(curp))
                    && rfc_stem != curp_stem
                {
                    stem_mismatch.push(record.row, format!("{rfc} / {curp}"));
                }

                let BirthDate::Column(birth) = resolve_birth_date(record, reference) else {
                    continue;
                };
                if let Some(date) = rfc.as_deref().and_then(|rfc| rfc_date(rfc, reference))
                    && date != birth
                {
                    rfc_date_mismatch.push(record.row, format!("{birth} vs {date}"));
                }
                if let Some(date) = curp.as_deref().and_then(curp_date)
                    && date != birth
                {
                    curp_date_mismatch.push(record.row, format!("{birth} vs {date}"));
                }
            }

            let count = stem_mismatch.len();
            findings.push_opt(stem_mismatch.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    "identity",
                    format!("{} donde los primeros 10 caracteres del RFC y la CURP no coinciden en {}", records_phrase(count), sheet.label()),
                )
                .with_suggestion("RFC y CURP de la misma persona comparten iniciales y fecha de nacimiento"),
            ));
            let count = rfc_date_mismatch.len();
            findings.push_opt(rfc_date_mismatch.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    CanonicalField::BirthDate.name(),
                    format!("{} con fecha de nacimiento distinta a la del RFC en {}", records_phrase(count), sheet.label()),
                ),
            ));
            let count = curp_date_mismatch.len();
            findings.push_opt(curp_date_mismatch.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    CanonicalField::BirthDate.name(),
                    format!("{} con fecha de nacimiento distinta a la de la CURP en {}", records_phrase(count), sheet.label()),
                )
                .with_suggestion("La CURP suele ser la fuente más confiable de la fecha de nacimiento"),
            ));
        }
        Ok(findings.finish("identity", "RFC, CURP y fechas de nacimiento son consistentes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::{active, context, dataset};

    #[test]
    fn consistent_identity_is_success() {
        let data = dataset(
            vec![active(
                2,
                &[
                    (CanonicalField::Rfc, "GOMJ800101AB1"),
                    (CanonicalField::Curp, "GOMJ800101HDFRRN00"),
                    (CanonicalField::BirthDate, "01/01/1980"),
                ],
            )],
            vec![],
        );
        let findings = IdentityConsistency.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].rows.is_empty());
    }

    #[test]
    fn flags_mismatches() {
        let data = dataset(
            vec![active(
                7,
                &[
                    (CanonicalField::Rfc, "GOMX800101AB1"),
                    (CanonicalField::Curp, "GOMJ800101HDFRRN00"),
                    (CanonicalField::BirthDate, "02/01/1980"),
                ],
            )],
            vec![],
        );
        let findings = IdentityConsistency.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(|f| f.rows == vec![7]));
    }
}
