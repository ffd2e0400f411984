//! Hire date presence and plausibility.

use chrono::Datelike;

use censo_model::{CanonicalField, Finding, MappedDataset, Severity, SheetKind};

use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::identity::resolve_birth_date;
use crate::unit::{UnitContext, ValidatorUnit};
use crate::util::{parse_date, whole_years};

const FIELD: CanonicalField = CanonicalField::HireDate;
const EARLIEST_YEAR: i32 = 1940;

pub struct HireDateValidator;

impl ValidatorUnit for HireDateValidator {
    fn name(&self) -> &'static str {
        "hire_date_validator"
    }

    fn description(&self) -> &'static str {
        "Valida la fecha de ingreso y la edad al ingreso"
    }

    fn priority(&self) -> u32 {
        8
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["birth_date_validator"]
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let valuation = ctx.valuation_date();
        let minimum_age = ctx.policy().minimum_working_age;
        let mut findings = Findings::new(self.name());

        for sheet in SheetKind::ALL {
            let gap_severity = match sheet {
                SheetKind::Active => Severity::Critical,
                SheetKind::Terminated => Severity::Warning,
            };
            let mut missing = RowIssues::default();
            let mut unreadable = RowIssues::default();
            let mut future = RowIssues::default();
            let mut ancient = RowIssues::default();
            let mut young_at_hire = RowIssues::default();
            let mapped = dataset.mapping(sheet).is_mapped(FIELD);

            for record in sheet_records(dataset, sheet)? {
                let Some(raw) = record.raw(FIELD).filter(|cell| !cell.is_blank()) else {
                    if mapped {
                        missing.push(record.row, "");
                    }
                    continue;
                };
                let Some(hired) = parse_date(raw) else {
                    unreadable.push(record.row, raw.as_text().into_owned());
                    continue;
                };
                if hired > valuation {
                    future.push(record.row, hired.to_string());
                } else if hired.year() < EARLIEST_YEAR {
                    ancient.push(record.row, hired.to_string());
                }
                if let Some(born) = resolve_birth_date(record, valuation).date()
                    && whole_years(born, hired).is_none_or(|age| age < minimum_age)
                {
                    young_at_hire.push(record.row, format!("{born} / {hired}"));
                }
            }

            let count = missing.len();
            findings.push_opt(missing.into_finding(
                sheet,
                Finding::of_severity(
                    self.name(),
                    FIELD.name(),
                    format!("{} sin fecha de ingreso en {}", records_phrase(count), sheet.label()),
                    gap_severity,
                )
                .with_suggestion("La antigüedad es indispensable para valuar prima de antigüedad e indemnizaciones"),
            ));
            let count = unreadable.len();
            findings.push_opt(unreadable.into_finding(
                sheet,
                Finding::of_severity(
                    self.name(),
                    FIELD.name(),
                    format!("{} con fecha de ingreso no interpretable en {}", records_phrase(count), sheet.label()),
                    gap_severity,
                )
                .with_suggestion("Use el formato DD/MM/AAAA"),
            ));
            let count = future.len();
            findings.push_opt(future.into_finding(
                sheet,
                Finding::of_severity(
                    self.name(),
                    FIELD.name(),
                    format!("{} con fecha de ingreso posterior a la fecha de valuación en {}", records_phrase(count), sheet.label()),
                    gap_severity,
                ),
            ));
            let count = ancient.len();
            findings.push_opt(ancient.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con fecha de ingreso anterior a {EARLIEST_YEAR} en {}", records_phrase(count), sheet.label()),
                ),
            ));
            let count = young_at_hire.len();
            findings.push_opt(young_at_hire.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!(
                        "{} con edad al ingreso menor a {minimum_age} años en {}",
                        records_phrase(count),
                        sheet.label()
                    ),
                )
                .with_suggestion("Verifique que fecha de ingreso y de nacimiento no estén invertidas"),
            ));
        }
        Ok(findings.finish(FIELD.name(), "Todas las fechas de ingreso son válidas"))
    }
}
