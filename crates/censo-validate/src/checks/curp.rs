//! CURP format, embedded date, state code and check digit.

use censo_model::{CanonicalField, Finding, MappedDataset, SheetKind};

use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::identity::{
    curp_date, curp_state, has_valid_curp_check_digit, is_curp_format, is_known_state,
};
use crate::unit::{UnitContext, ValidatorUnit};

const FIELD: CanonicalField = CanonicalField::Curp;

pub struct CurpValidator;

impl ValidatorUnit for CurpValidator {
    fn name(&self) -> &'static str {
        "curp_validator"
    }

    fn description(&self) -> &'static str {
        "Valida formato, fecha, entidad y dígito verificador de la CURP"
    }

    fn priority(&self) -> u32 {
        3
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
            let mut invalid = RowIssues::default();
            let mut bad_date = RowIssues::default();
            let mut bad_state = RowIssues::default();
            let mut bad_digit = RowIssues::default();

            for record in sheet_records(dataset, sheet)? {
                let Some(curp) = record.identifier(FIELD) else {
                    continue;
                };
                if !is_curp_format(&curp) {
                    invalid.push(record.row, curp);
                } else if curp_date(&curp).is_none() {
                    bad_date.push(record.row, curp);
                } else if !curp_state(&curp).is_some_and(is_known_state) {
                    bad_state.push(record.row, curp);
                } else if !has_valid_curp_check_digit(&curp) {
                    bad_digit.push(record.row, curp);
                }
            }

            let count = invalid.len();
            findings.push_opt(invalid.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con CURP de formato inválido en {}", records_phrase(count), sheet.label()),
                )
                .with_suggestion("La CURP tiene 18 caracteres: 4 letras, fecha AAMMDD, sexo, entidad, 3 consonantes y 2 verificadores"),
            ));
            let count = bad_date.len();
            findings.push_opt(bad_date.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con CURP cuya fecha no existe en {}", records_phrase(count), sheet.label()),
                ),
            ));
            let count = bad_state.len();
            findings.push_opt(bad_state.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con entidad federativa desconocida en la CURP en {}", records_phrase(count), sheet.label()),
                ),
            ));
            let count = bad_digit.len();
            findings.push_opt(bad_digit.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con dígito verificador de CURP incorrecto en {}", records_phrase(count), sheet.label()),
                )
                .with_suggestion("Verifique la CURP en el portal de RENAPO"),
            ));
        }
        Ok(findings.finish(FIELD.name(), "Todas las CURP son válidas"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::{active, context, dataset, terminated};

    #[test]
    fn valid_curps_report_success() {
        let data = dataset(
            vec![active(2, &[(FIELD, "GOMJ800101HDFRRN00")])],
            vec![terminated(2, &[(FIELD, "PELA800101MDFRNN08")])],
        );
        let findings = CurpValidator.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("válidas"));
    }

    #[test]
    fn reports_each_defect_once() {
        let data = dataset(
            vec![
                active(2, &[(FIELD, "GOMJ800101HDFRRN01")]),
                active(3, &[(FIELD, "GOMJ800101HXXRRN00")]),
                active(4, &[(FIELD, "GOMJ801301HDFRRN00")]),
                active(5, &[(FIELD, "NOESCURP")]),
            ],
            vec![],
        );
        let findings = CurpValidator.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 4);
        assert_eq!(findings[0].rows, vec![5]);
        assert_eq!(findings[1].rows, vec![4]);
        assert_eq!(findings[2].rows, vec![3]);
        assert_eq!(findings[3].rows, vec![2]);
    }
}
