//! Birth date presence, readability and plausibility.
//!
//! A missing or unreadable birth date falls back to the date embedded in the
//! CURP, then the RFC. Only records with no usable source are critical.

use censo_model::{CanonicalField, Finding, MappedDataset, Severity, SheetKind};
use chrono::Datelike;

use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::identity::{BirthDate, resolve_birth_date};
use crate::unit::{UnitContext, ValidatorUnit};

const FIELD: CanonicalField = CanonicalField::BirthDate;
/// Earliest year accepted as a real birth date.
const EARLIEST_YEAR: i32 = 1900;

pub struct BirthDateValidator;

impl ValidatorUnit for BirthDateValidator {
    fn name(&self) -> &'static str {
        "birth_date_validator"
    }

    fn description(&self) -> &'static str {
        "Obtiene y valida la fecha de nacimiento, con respaldo en RFC y CURP"
    }

    fn priority(&self) -> u32 {
        6
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
        let valuation = ctx.valuation_date();
        for sheet in SheetKind::ALL {
            // Terminated employees are not valued; gaps there only warn.
            let gap_severity = match sheet {
                SheetKind::Active => Severity::Critical,
                SheetKind::Terminated => Severity::Warning,
            };
            let mut missing = RowIssues::default();
            let mut unreadable = RowIssues::default();
            let mut extracted = RowIssues::default();
            let mut recovered = RowIssues::default();
            let mut future = RowIssues::default();
            let mut ancient = RowIssues::default();

            for record in sheet_records(dataset, sheet)? {
                let resolved = resolve_birth_date(record, valuation);
                match &resolved {
                    BirthDate::Missing => missing.push(record.row, ""),
                    BirthDate::Unparseable(text) => unreadable.push(record.row, text.clone()),
                    BirthDate::Extracted {
                        from,
                        unusable: Some(text),
                        ..
                    } => recovered.push(record.row, format!("{text} → {}", from.label())),
                    BirthDate::Extracted { from, .. } => {
                        extracted.push(record.row, from.label().to_string());
                    }
                    BirthDate::Column(_) | BirthDate::EmbeddedInColumn(_) => {}
                }
                if let Some(date) = resolved.date() {
                    if date > valuation {
                        future.push(record.row, date.to_string());
                    } else if date.year() < EARLIEST_YEAR {
                        ancient.push(record.row, date.to_string());
                    }
                }
            }

            let count = missing.len();
            findings.push_opt(missing.into_finding(
                sheet,
                Finding::of_severity(
                    self.name(),
                    FIELD.name(),
                    format!("{} sin fecha de nacimiento en {}", records_phrase(count), sheet.label()),
                    gap_severity,
                )
                .with_suggestion("Capture la fecha de nacimiento o la CURP del empleado"),
            ));
            let count = unreadable.len();
            findings.push_opt(unreadable.into_finding(
                sheet,
                Finding::of_severity(
                    self.name(),
                    FIELD.name(),
                    format!("{} con fecha de nacimiento no interpretable en {}", records_phrase(count), sheet.label()),
                    gap_severity,
                )
                .with_suggestion("Use el formato DD/MM/AAAA"),
            ));
            let count = recovered.len();
            findings.push_opt(recovered.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con fecha de nacimiento ilegible; se tomó la de RFC/CURP en {}", records_phrase(count), sheet.label()),
                ),
            ));
            let count = extracted.len();
            findings.push_opt(extracted.into_finding(
                sheet,
                Finding::info(
                    self.name(),
                    FIELD.name(),
                    format!("{} con fecha de nacimiento extraída de RFC/CURP en {}", records_phrase(count), sheet.label()),
                ),
            ));
            let count = future.len();
            findings.push_opt(future.into_finding(
                sheet,
                Finding::of_severity(
                    self.name(),
                    FIELD.name(),
                    format!("{} con fecha de nacimiento posterior a la fecha de valuación en {}", records_phrase(count), sheet.label()),
                    gap_severity,
                ),
            ));
            let count = ancient.len();
            findings.push_opt(ancient.into_finding(
                sheet,
                Finding::warning(
                    self.name(),
                    FIELD.name(),
                    format!("{} con fecha de nacimiento anterior a {EARLIEST_YEAR} en {}", records_phrase(count), sheet.label()),
                ),
            ));
        }
        Ok(findings.finish(FIELD.name(), "Todas las fechas de nacimiento son válidas"))
    }
}
