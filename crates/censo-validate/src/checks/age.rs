//! Age at the valuation date.

use serde_json::json;

use censo_model::{CanonicalField, Finding, MappedDataset, SheetKind};

use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::identity::resolve_birth_date;
use crate::unit::{UnitContext, ValidatorUnit};
use crate::util::whole_years;

const ADULT_AGE: u32 = 18;
const RETIREMENT_AGE: u32 = 65;

pub struct AgeValidator;

impl ValidatorUnit for AgeValidator {
    fn name(&self) -> &'static str {
        "age_validator"
    }

    fn description(&self) -> &'static str {
        "Verifica que la edad a la fecha de valuación esté en el rango laboral"
    }

    fn priority(&self) -> u32 {
        7
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["birth_date_validator"]
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let policy = ctx.policy();
        let valuation = ctx.valuation_date();
        let sheet = SheetKind::Active;

        let mut too_young = RowIssues::default();
        let mut minors = RowIssues::default();
        let mut too_old = RowIssues::default();
        let mut retirement = RowIssues::default();
        let mut ages = Vec::new();

        for record in sheet_records(dataset, sheet)? {
            let Some(birth) = resolve_birth_date(record, valuation).date() else {
                continue;
            };
            let Some(age) = whole_years(birth, valuation) else {
                continue;
            };
            ages.push(age);
            if age < policy.minimum_working_age {
                too_young.push(record.row, age.to_string());
            } else if age < ADULT_AGE {
                minors.push(record.row, age.to_string());
            } else if age > policy.maximum_age {
                too_old.push(record.row, age.to_string());
            } else if age >= RETIREMENT_AGE {
                retirement.push(record.row, age.to_string());
            }
        }

        let mut findings = Findings::new(self.name());
        let field = CanonicalField::BirthDate.name();
        let count = too_young.len();
        findings.push_opt(too_young.into_finding(
            sheet,
            Finding::critical(
                self.name(),
                field,
                format!(
                    "{} con edad menor a {} años a la fecha de valuación",
                    records_phrase(count),
                    policy.minimum_working_age
                ),
            )
            .with_suggestion("Revise la fecha de nacimiento; la edad mínima legal para trabajar es 15 años"),
        ));
        let count = too_old.len();
        findings.push_opt(too_old.into_finding(
            sheet,
            Finding::critical(
                self.name(),
                field,
                format!(
                    "{} con edad mayor a {} años a la fecha de valuación",
                    records_phrase(count),
                    policy.maximum_age
                ),
            )
            .with_suggestion("Probablemente la fecha de nacimiento está capturada con error"),
        ));
        let count = minors.len();
        findings.push_opt(minors.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                field,
                format!("{} de trabajadores menores de edad", records_phrase(count)),
            ),
        ));
        let count = retirement.len();
        findings.push_opt(retirement.into_finding(
            sheet,
            Finding::info(
                self.name(),
                field,
                format!(
                    "{} en edad de retiro ({RETIREMENT_AGE} años o más)",
                    records_phrase(count)
                ),
            ),
        ));

        if findings.is_empty() && !ages.is_empty() {
            let average = ages.iter().map(|age| f64::from(*age)).sum::<f64>() / ages.len() as f64;
            findings.push(
                Finding::success(
                    self.name(),
                    field,
                    format!("Edades dentro del rango laboral; edad promedio {average:.1} años"),
                )
                .with_metadata(json!({ "averageAge": average, "valued": ages.len() })),
            );
        }
        Ok(findings.finish(field, "No hay edades que validar"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::{active, context, dataset};
    use censo_model::Severity;

    #[test]
    fn ages_in_range_report_average() {
        let data = dataset(
            vec![
                active(2, &[(CanonicalField::BirthDate, "01/01/1980")]),
                active(3, &[(CanonicalField::BirthDate, "01/01/1990")]),
            ],
            vec![],
        );
        let findings = AgeValidator.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("39.0"));
    }

    #[test]
    fn out_of_range_ages_are_critical() {
        let data = dataset(
            vec![
                active(2, &[(CanonicalField::BirthDate, "01/01/2014")]),
                active(3, &[(CanonicalField::BirthDate, "01/01/1900")]),
                active(4, &[(CanonicalField::BirthDate, "01/06/2008")]),
            ],
            vec![],
        );
        let findings = AgeValidator.validate(&data, &context()).unwrap();
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].rows, vec![2]);
        assert_eq!(findings[1].severity, Severity::Critical);
        assert_eq!(findings[1].rows, vec![3]);
        assert_eq!(findings[2].severity, Severity::Warning);
        assert_eq!(findings[2].rows, vec![4]);
    }
}
