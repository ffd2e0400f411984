//! Interquartile-range outliers on the daily salary.

use serde_json::json;

use censo_model::{CanonicalField, Finding, MappedDataset, SheetKind};

use super::salary::effective_daily_salary;
use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::unit::{UnitContext, ValidatorUnit};
use crate::util::quantile;

/// Fewer salaries than this give meaningless quartiles.
const MIN_SAMPLE: usize = 5;

pub struct SalaryOutlierAnalyzer;

impl ValidatorUnit for SalaryOutlierAnalyzer {
    fn name(&self) -> &'static str {
        "salary_outlier_analyzer"
    }

    fn description(&self) -> &'static str {
        "Detecta salarios atípicos mediante el rango intercuartílico"
    }

    fn priority(&self) -> u32 {
        13
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
        let field = CanonicalField::DailySalary.name();
        let salaries: Vec<(usize, f64)> = sheet_records(dataset, sheet)?
            .iter()
            .filter_map(|record| {
                effective_daily_salary(record)
                    .filter(|salary| *salary > 0.0)
                    .map(|salary| (record.row, salary))
            })
            .collect();

        let findings = Findings::new(self.name());
        if salaries.len() < MIN_SAMPLE {
            return Ok(findings.finish(
                field,
                format!("Menos de {MIN_SAMPLE} salarios; no se analizan valores atípicos"),
            ));
        }

        let mut sorted: Vec<f64> = salaries.iter().map(|(_, salary)| *salary).collect();
        sorted.sort_by(f64::total_cmp);
        let (Some(q1), Some(q3)) = (quantile(&sorted, 0.25), quantile(&sorted, 0.75)) else {
            return Ok(findings.finish(field, "Sin salarios que analizar"));
        };
        let iqr = q3 - q1;
        if iqr <= 0.0 {
            return Ok(findings.finish(field, "Salarios homogéneos; no hay valores atípicos"));
        }
        let k = ctx.policy().salary_outlier_iqr_factor;
        let lower = q1 - k * iqr;
        let upper = q3 + k * iqr;

        let mut high = RowIssues::default();
        let mut low = RowIssues::default();
        for (row, salary) in &salaries {
            if *salary > upper {
                high.push(*row, format!("{salary:.2}"));
            } else if *salary < lower {
                low.push(*row, format!("{salary:.2}"));
            }
        }

        let bounds = json!({ "q1": q1, "q3": q3, "lower": lower, "upper": upper });
        let mut findings = findings;
        for (issues, direction) in [
            (high, "por encima del límite superior"),
            (low, "por debajo del límite inferior"),
        ] {
            let count = issues.len();
            findings.push_opt(
                issues
                    .into_finding(
                        sheet,
                        Finding::warning(
                            self.name(),
                            field,
                            format!("{} con salario atípico {direction}", records_phrase(count)),
                        )
                        .with_suggestion("Revise si el importe es mensual, anual o tiene un error de captura"),
                    )
                    .map(|finding| {
                        let mut metadata = finding.metadata.clone().unwrap_or_else(|| json!({}));
                        metadata["bounds"] = bounds.clone();
                        finding.with_metadata(metadata)
                    }),
            );
        }
        Ok(findings.finish(
            field,
            format!("Sin salarios atípicos (rango {lower:.2} a {upper:.2})"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::{active, context, dataset};

    fn salaries(values: &[&str]) -> MappedDataset {
        let records = values
            .iter()
            .enumerate()
            .map(|(index, value)| active(index + 2, &[(CanonicalField::DailySalary, value)]))
            .collect();
        dataset(records, vec![])
    }

    #[test]
    fn small_samples_are_skipped() {
        let findings = SalaryOutlierAnalyzer
            .validate(&salaries(&["500", "90000"]), &context())
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].rows.is_empty());
    }

    #[test]
    fn flags_high_outlier() {
        let data = salaries(&["400", "450", "500", "550", "600", "650", "50000"]);
        let findings = SalaryOutlierAnalyzer.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rows, vec![8]);
        assert!(findings[0].metadata.as_ref().unwrap()["bounds"]["upper"].is_number());
    }
}
