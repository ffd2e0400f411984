//! Contribution ceiling (25 UMA) on the integrated salary.

use serde_json::json;

use censo_model::{CanonicalField, Finding, MappedDataset, SheetKind};

use super::salary::effective_daily_salary;
use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::unit::{UnitContext, ValidatorUnit};

/// Salaries this many times the ceiling are treated as capture errors.
const IMPLAUSIBLE_MULTIPLE: f64 = 10.0;

pub struct SalaryCeilingValidator;

impl ValidatorUnit for SalaryCeilingValidator {
    fn name(&self) -> &'static str {
        "salary_ceiling_validator"
    }

    fn description(&self) -> &'static str {
        "Identifica salarios que exceden el tope de cotización"
    }

    fn priority(&self) -> u32 {
        12
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["integrated_salary_validator"]
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let sheet = SheetKind::Active;
        let ceiling = ctx.policy().contribution_ceiling();
        let implausible = ceiling * IMPLAUSIBLE_MULTIPLE;
        let mut capped = RowIssues::default();
        let mut extreme = RowIssues::default();

        for record in sheet_records(dataset, sheet)? {
            let Some(salary) = record
                .number(CanonicalField::IntegratedSalary)
                .or_else(|| effective_daily_salary(record))
            else {
                continue;
            };
            if salary > implausible {
                extreme.push(record.row, format!("{salary:.2}"));
            } else if salary > ceiling {
                capped.push(record.row, format!("{salary:.2}"));
            }
        }

        let mut findings = Findings::new(self.name());
        let field = CanonicalField::IntegratedSalary.name();
        let count = extreme.len();
        findings.push_opt(extreme.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                field,
                format!(
                    "{} con salario mayor a {IMPLAUSIBLE_MULTIPLE} veces el tope de cotización",
                    records_phrase(count)
                ),
            )
            .with_suggestion("Verifique que no se haya capturado el sueldo mensual o anual como diario"),
        ));
        let count = capped.len();
        findings.push_opt(capped.into_finding(
            sheet,
            Finding::info(
                self.name(),
                field,
                format!(
                    "{} con salario integrado topado a 25 UMA (${ceiling:.2} diarios)",
                    records_phrase(count)
                ),
            )
            .with_status(censo_model::FindingStatus::Warning),
        ));
        let findings = findings.finish(
            field,
            format!("Ningún salario excede el tope de cotización (${ceiling:.2})"),
        );
        Ok(findings
            .into_iter()
            .map(|finding| {
                let mut metadata = finding.metadata.clone().unwrap_or_else(|| json!({}));
                metadata["ceiling"] = json!(ceiling);
                finding.with_metadata(metadata)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::{active, context, dataset};
    use censo_model::Severity;

    #[test]
    fn ceiling_is_informational() {
        let data = dataset(
            vec![
                active(2, &[(CanonicalField::IntegratedSalary, "3000")]),
                active(3, &[(CanonicalField::DailySalary, "500")]),
                active(4, &[(CanonicalField::DailySalary, "90000")]),
            ],
            vec![],
        );
        let findings = SalaryCeilingValidator.validate(&data, &context()).unwrap();
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].rows, vec![4]);
        assert_eq!(findings[1].severity, Severity::Info);
        assert_eq!(findings[1].rows, vec![2]);
        let ceiling = findings[1].metadata.as_ref().unwrap()["ceiling"].as_f64().unwrap();
        assert!((ceiling - 2714.25).abs() < 1e-6);
    }
}
