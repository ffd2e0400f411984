//! NSS (IMSS social security number) checks.

use censo_model::{CanonicalField, Finding, MappedDataset, SheetKind};

use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::identity::{is_valid_nss, nss_digits};
use crate::unit::{UnitContext, ValidatorUnit};

const FIELD: CanonicalField = CanonicalField::Nss;

pub struct NssValidator;

impl ValidatorUnit for NssValidator {
    fn name(&self) -> &'static str {
        "nss_validator"
    }

    fn description(&self) -> &'static str {
        "Valida longitud y dígito verificador del número de seguridad social"
    }

    fn priority(&self) -> u32 {
        4
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
            let mut malformed = RowIssues::default();
            let mut bad_digit = RowIssues::default();
            let mut lost_zero = RowIssues::default();

            for record in sheet_records(dataset, sheet)? {
                let Some(raw) = record.text(FIELD) else {
                    continue;
                };
                let Some(digits) = nss_digits(raw.trim()) else {
                    malformed.push(record.row, raw.into_owned());
                    continue;
                };
                match digits.len() {
                    11 if is_valid_nss(&digits) => {}
                    11 => bad_digit.push(record.row, digits),
                    // Spreadsheets drop the leading zero of numeric cells.
                    10 if is_valid_nss(&format!("0{digits}")) => lost_zero.push(record.row, digits),
                    _ => malformed.push(record.row, digits),
                }
            }

            let count = malformed.len();
            findings.push_opt(malformed.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con NSS que no tiene 11 dígitos en {}", records_phrase(count), sheet.label()),
                ),
            ));
            let count = bad_digit.len();
            findings.push_opt(bad_digit.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con dígito verificador de NSS incorrecto en {}", records_phrase(count), sheet.label()),
                )
                .with_suggestion("Confirme el NSS contra la constancia del IMSS"),
            ));
            let count = lost_zero.len();
            findings.push_opt(lost_zero.into_finding(
                sheet,
                Finding::info(
                    self.name(),
                    FIELD.name(),
                    format!("{} con NSS al que le falta el cero inicial en {}", records_phrase(count), sheet.label()),
                )
                .with_suggestion("Formatee la columna de NSS como texto"),
            ));
        }
        Ok(findings.finish(FIELD.name(), "Todos los NSS son válidos"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::{active, context, dataset};
    use censo_model::Severity;

    #[test]
    fn accepts_separated_numbers() {
        let data = dataset(vec![active(2, &[(FIELD, "1234-5678-903")])], vec![]);
        let findings = NssValidator.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert!(findings[0].rows.is_empty());
    }

    #[test]
    fn classifies_defects() {
        let data = dataset(
            vec![
                active(2, &[(FIELD, "12345678904")]),
                active(3, &[(FIELD, "123")]),
                active(4, &[(FIELD, "1234567897")]),
            ],
            vec![],
        );
        let findings = NssValidator.validate(&data, &context()).unwrap();
        assert_eq!(findings[0].rows, vec![3]);
        assert_eq!(findings[1].rows, vec![2]);
        assert_eq!(findings[2].rows, vec![4]);
        assert_eq!(findings[2].severity, Severity::Info);
    }
}
