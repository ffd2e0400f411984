//! RFC (Registro Federal de Contribuyentes) format checks.

use censo_model::{CanonicalField, Finding, MappedDataset, SheetKind};

use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::identity::{GENERIC_RFCS, RfcKind, classify_rfc, rfc_date};
use crate::unit::{UnitContext, ValidatorUnit};

const FIELD: CanonicalField = CanonicalField::Rfc;

pub struct RfcValidator;

impl ValidatorUnit for RfcValidator {
    fn name(&self) -> &'static str {
        "rfc_validator"
    }

    fn description(&self) -> &'static str {
        "Valida el formato del RFC y la fecha que contiene"
    }

    fn priority(&self) -> u32 {
        2
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let mut findings = Findings::new(self.name());
        for sheet in SheetKind::ALL {
            if !dataset.mapping(sheet).is_mapped(FIELD) {
                continue;
            }
            let mut invalid = RowIssues::default();
            let mut bad_date = RowIssues::default();
            let mut company = RowIssues::default();
            let mut short = RowIssues::default();
            let mut generic = RowIssues::default();

            for record in sheet_records(dataset, sheet)? {
                let Some(rfc) = record.identifier(FIELD) else {
                    continue;
                };
                if GENERIC_RFCS.contains(&rfc.as_str()) {
                    generic.push(record.row, rfc);
                    continue;
                }
                match classify_rfc(&rfc) {
                    None => invalid.push(record.row, rfc),
                    Some(kind) => {
                        if rfc_date(&rfc, ctx.valuation_date()).is_none() {
                            bad_date.push(record.row, rfc);
                        } else if kind == RfcKind::Company {
                            company.push(record.row, rfc);
                        } else if kind == RfcKind::PersonWithoutHomoclave {
                            short.push(record.row, rfc);
                        }
                    }
                }
            }

            let count = invalid.len();
            findings.push_opt(invalid.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con RFC de formato inválido en {}", records_phrase(count), sheet.label()),
                )
                .with_suggestion("El RFC de persona física tiene 4 letras, 6 dígitos de fecha y 3 de homoclave"),
            ));
            let count = bad_date.len();
            findings.push_opt(bad_date.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con RFC cuya fecha no existe en {}", records_phrase(count), sheet.label()),
                ),
            ));
            let count = company.len();
            findings.push_opt(company.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con RFC de persona moral en {}", records_phrase(count), sheet.label()),
                )
                .with_suggestion("Los empleados deben registrarse con RFC de persona física"),
            ));
            let count = short.len();
            findings.push_opt(short.into_finding(
                sheet,
                Finding::info(
                    self.name(),
                    FIELD.name(),
                    format!("{} con RFC sin homoclave en {}", records_phrase(count), sheet.label()),
                ),
            ));
            let count = generic.len();
            findings.push_opt(generic.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con RFC genérico en {}", records_phrase(count), sheet.label()),
                )
                .with_suggestion("Sustituya el RFC genérico por el RFC real del trabajador"),
            ));
        }
        Ok(findings.finish(FIELD.name(), "Todos los RFC tienen formato válido"))
    }
}
