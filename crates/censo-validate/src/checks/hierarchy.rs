//! Employee type and hierarchy coherence.

use censo_model::{CanonicalField, Finding, MappedDataset, SheetKind};

use super::position::{EmployeeType, PositionClass, classify_position, parse_employee_type};
use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::unit::{UnitContext, ValidatorUnit};

/// Directive share above which the staff structure looks implausible.
const DIRECTIVE_SHARE_LIMIT: f64 = 0.3;
/// Population needed before the directive share is meaningful.
const MIN_POPULATION: usize = 10;

pub struct HierarchyValidator;

impl ValidatorUnit for HierarchyValidator {
    fn name(&self) -> &'static str {
        "hierarchy_validator"
    }

    fn description(&self) -> &'static str {
        "Valida el tipo de personal y su congruencia con el puesto"
    }

    fn priority(&self) -> u32 {
        15
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["position_classifier"]
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        _ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let sheet = SheetKind::Active;
        let field = CanonicalField::EmployeeType.name();
        let records = sheet_records(dataset, sheet)?;

        let mut unknown_type = RowIssues::default();
        let mut unionized_directive = RowIssues::default();
        let mut temporary = RowIssues::default();
        let mut directives = 0usize;
        let mut titled = 0usize;

        for record in records {
            let class = record
                .text(CanonicalField::Position)
                .and_then(|title| classify_position(&title));
            if record.has(CanonicalField::Position) {
                titled += 1;
            }
            if class == Some(PositionClass::Directive) {
                directives += 1;
            }
            let Some(text) = record.text(CanonicalField::EmployeeType) else {
                continue;
            };
            match parse_employee_type(&text) {
                None => unknown_type.push(record.row, text.into_owned()),
                Some(EmployeeType::Unionized) if class == Some(PositionClass::Directive) => {
                    let title = record
                        .text(CanonicalField::Position)
                        .map(|title| title.into_owned())
                        .unwrap_or_default();
                    unionized_directive.push(record.row, title);
                }
                Some(EmployeeType::Temporary) => temporary.push(record.row, text.into_owned()),
                Some(_) => {}
            }
        }

        let mut findings = Findings::new(self.name());
        let count = unknown_type.len();
        findings.push_opt(unknown_type.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                field,
                format!("{} con tipo de personal no reconocido", records_phrase(count)),
            )
            .with_suggestion("Use Sindicalizado, Confianza o Eventual"),
        ));
        let count = unionized_directive.len();
        findings.push_opt(unionized_directive.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                field,
                format!("{} con puesto directivo registrado como sindicalizado", records_phrase(count)),
            )
            .with_suggestion("Los puestos de dirección son de confianza por ley (art. 9 LFT)"),
        ));
        let count = temporary.len();
        findings.push_opt(temporary.into_finding(
            sheet,
            Finding::info(
                self.name(),
                field,
                format!("{} de personal eventual", records_phrase(count)),
            ),
        ));
        if titled >= MIN_POPULATION {
            let share = directives as f64 / titled as f64;
            if share > DIRECTIVE_SHARE_LIMIT {
                findings.push(Finding::warning(
                    self.name(),
                    CanonicalField::Position.name(),
                    format!(
                        "{:.0}% del personal tiene puesto directivo; la estructura parece inusual",
                        share * 100.0
                    ),
                ));
            }
        }
        Ok(findings.finish(field, "Tipos de personal y jerarquía congruentes"))
    }
}
