//! Daily salary presence, sign and minimum wage.

use censo_model::{CanonicalField, CanonicalRecord, Finding, MappedDataset, SheetKind};

use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::unit::{UnitContext, ValidatorUnit};

/// Days per month used by IMSS to convert monthly to daily pay.
pub const DAYS_PER_MONTH: f64 = 30.4;
/// Accepted relative gap between monthly salary and daily × 30.4.
const MONTHLY_TOLERANCE: f64 = 0.10;

const FIELD: CanonicalField = CanonicalField::DailySalary;

/// Daily salary, derived from the monthly salary when only that is present.
pub fn effective_daily_salary(record: &CanonicalRecord) -> Option<f64> {
    record.number(FIELD).or_else(|| {
        record
            .number(CanonicalField::MonthlySalary)
            .map(|monthly| monthly / DAYS_PER_MONTH)
    })
}

pub struct SalaryValidator;

impl ValidatorUnit for SalaryValidator {
    fn name(&self) -> &'static str {
        "salary_validator"
    }

    fn description(&self) -> &'static str {
        "Verifica salario diario, salario mínimo y congruencia con el sueldo mensual"
    }

    fn priority(&self) -> u32 {
        10
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let sheet = SheetKind::Active;
        let mapping = dataset.mapping(sheet);
        let mut findings = Findings::new(self.name());
        if !mapping.is_mapped(FIELD) && !mapping.is_mapped(CanonicalField::MonthlySalary) {
            return Ok(findings.finish(FIELD.name(), "Sin columna de salario que validar"));
        }
        let minimum_wage = ctx.policy().minimum_daily_wage;

        let mut missing = RowIssues::default();
        let mut non_positive = RowIssues::default();
        let mut below_minimum = RowIssues::default();
        let mut derived = RowIssues::default();
        let mut inconsistent = RowIssues::default();

        for record in sheet_records(dataset, sheet)? {
            let daily = record.number(FIELD);
            let monthly = record.number(CanonicalField::MonthlySalary);
            let Some(effective) = effective_daily_salary(record) else {
                missing.push(record.row, "");
                continue;
            };
            if daily.is_none() {
                derived.push(record.row, format!("{effective:.2}"));
            }
            if effective <= 0.0 {
                non_positive.push(record.row, format!("{effective:.2}"));
                continue;
            }
            if effective < minimum_wage {
                below_minimum.push(record.row, format!("{effective:.2}"));
            }
            if let (Some(daily), Some(monthly)) = (daily, monthly)
                && monthly > 0.0
            {
                let expected = daily * DAYS_PER_MONTH;
                if ((monthly - expected) / expected).abs() > MONTHLY_TOLERANCE {
                    inconsistent.push(record.row, format!("{daily:.2} × 30.4 ≠ {monthly:.2}"));
                }
            }
        }

        let count = missing.len();
        findings.push_opt(missing.into_finding(
            sheet,
            Finding::critical(
                self.name(),
                FIELD.name(),
                format!("{} de personal activo sin salario", records_phrase(count)),
            )
            .with_suggestion("El salario es indispensable para calcular las obligaciones laborales"),
        ));
        let count = non_positive.len();
        findings.push_opt(non_positive.into_finding(
            sheet,
            Finding::critical(
                self.name(),
                FIELD.name(),
                format!("{} con salario cero o negativo", records_phrase(count)),
            ),
        ));
        let count = below_minimum.len();
        findings.push_opt(below_minimum.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                FIELD.name(),
                format!(
                    "{} con salario diario menor al mínimo (${minimum_wage:.2})",
                    records_phrase(count)
                ),
            )
            .with_suggestion("Confirme si se trata de jornadas reducidas o de un error de captura"),
        ));
        let count = derived.len();
        findings.push_opt(derived.into_finding(
            sheet,
            Finding::info(
                self.name(),
                FIELD.name(),
                format!("{} con salario diario derivado del sueldo mensual", records_phrase(count)),
            ),
        ));
        let count = inconsistent.len();
        findings.push_opt(inconsistent.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                CanonicalField::MonthlySalary.name(),
                format!("{} cuyo sueldo mensual no corresponde al salario diario × 30.4", records_phrase(count)),
            ),
        ));
        Ok(findings.finish(FIELD.name(), "Todos los salarios diarios son válidos"))
    }
}
