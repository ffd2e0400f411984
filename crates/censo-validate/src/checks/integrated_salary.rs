//! Integrated daily salary (SDI) against the base daily salary.

use censo_model::{CanonicalField, Finding, MappedDataset, SheetKind};

use super::salary::effective_daily_salary;
use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::unit::{UnitContext, ValidatorUnit};

const FIELD: CanonicalField = CanonicalField::IntegratedSalary;

pub struct IntegratedSalaryValidator;

impl ValidatorUnit for IntegratedSalaryValidator {
    fn name(&self) -> &'static str {
        "integrated_salary_validator"
    }

    fn description(&self) -> &'static str {
        "Verifica que el salario diario integrado respete el factor mínimo de integración"
    }

    fn priority(&self) -> u32 {
        11
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["salary_validator"]
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let sheet = SheetKind::Active;
        let mut findings = Findings::new(self.name());
        if !dataset.mapping(sheet).is_mapped(FIELD) {
            return Ok(findings.finish(
                FIELD.name(),
                "Sin columna de salario integrado; se usará el factor mínimo de integración",
            ));
        }
        let factor = ctx.policy().minimum_integration_factor;

        let mut non_positive = RowIssues::default();
        let mut below_base = RowIssues::default();
        let mut low_factor = RowIssues::default();

        for record in sheet_records(dataset, sheet)? {
            let Some(integrated) = record.number(FIELD) else {
                continue;
            };
            if integrated <= 0.0 {
                non_positive.push(record.row, format!("{integrated:.2}"));
                continue;
            }
            let Some(daily) = effective_daily_salary(record).filter(|daily| *daily > 0.0) else {
                continue;
            };
            let ratio = integrated / daily;
            if ratio < 1.0 {
                below_base.push(record.row, format!("{integrated:.2} < {daily:.2}"));
            } else if ratio < factor {
                low_factor.push(record.row, format!("{ratio:.4}"));
            }
        }

        let count = non_positive.len();
        findings.push_opt(non_positive.into_finding(
            sheet,
            Finding::critical(
                self.name(),
                FIELD.name(),
                format!("{} con salario integrado cero o negativo", records_phrase(count)),
            ),
        ));
        let count = below_base.len();
        findings.push_opt(below_base.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                FIELD.name(),
                format!("{} con salario integrado menor al salario diario", records_phrase(count)),
            )
            .with_suggestion("El SDI incluye el salario diario más prestaciones; no puede ser menor"),
        ));
        let count = low_factor.len();
        findings.push_opt(low_factor.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                FIELD.name(),
                format!(
                    "{} con factor de integración menor al mínimo de ley ({factor:.4})",
                    records_phrase(count)
                ),
            )
            .with_suggestion("El factor mínimo considera 15 días de aguinaldo y la prima vacacional"),
        ));
        Ok(findings.finish(FIELD.name(), "Todos los salarios integrados son congruentes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::{active, context, dataset};
    use censo_model::Severity;

    #[test]
    fn integration_factor_checks() {
        let data = dataset(
            vec![
                active(2, &[(CanonicalField::DailySalary, "500"), (FIELD, "530")]),
                active(3, &[(CanonicalField::DailySalary, "500"), (FIELD, "450")]),
                active(4, &[(CanonicalField::DailySalary, "500"), (FIELD, "510")]),
                active(5, &[(CanonicalField::DailySalary, "500"), (FIELD, "-1")]),
            ],
            vec![],
        );
        let findings = IntegratedSalaryValidator.validate(&data, &context()).unwrap();
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].rows, vec![5]);
        assert_eq!(findings[1].rows, vec![3]);
        assert_eq!(findings[2].rows, vec![4]);
        assert_eq!(findings.len(), 3);
    }
}
