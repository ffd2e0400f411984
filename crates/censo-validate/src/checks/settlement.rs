//! Termination causes and payments against the legal minimum (LFT).

use serde_json::json;

use censo_model::{CanonicalField, CanonicalRecord, Finding, MappedDataset, SheetKind};

use super::salary::effective_daily_salary;
use super::termination::{hire_date, termination_date};
use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::policy::ValidationPolicy;
use crate::unit::{UnitContext, ValidatorUnit};
use crate::util::{fractional_years, match_label};

/// Days of salary per year of service for the seniority premium (art. 162).
const PREMIUM_DAYS_PER_YEAR: f64 = 12.0;
/// Years after which a voluntary resignation also earns the premium.
const PREMIUM_RESIGNATION_YEARS: f64 = 15.0;
/// Constitutional indemnity (art. 50 fr. III).
const INDEMNITY_BASE_DAYS: f64 = 90.0;
/// Twenty days per year of service (art. 50 fr. II).
const INDEMNITY_DAYS_PER_YEAR: f64 = 20.0;
/// Relative shortfall tolerated before a payment is flagged.
const PAYMENT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparationCause {
    VoluntaryResignation,
    UnjustifiedDismissal,
    JustifiedDismissal,
    Death,
    Disability,
    Retirement,
    ContractEnd,
    MutualAgreement,
}

impl SeparationCause {
    pub fn label(self) -> &'static str {
        match self {
            Self::VoluntaryResignation => "renuncia voluntaria",
            Self::UnjustifiedDismissal => "despido injustificado",
            Self::JustifiedDismissal => "despido justificado",
            Self::Death => "defunción",
            Self::Disability => "invalidez",
            Self::Retirement => "jubilación",
            Self::ContractEnd => "término de contrato",
            Self::MutualAgreement => "mutuo acuerdo",
        }
    }
}

const CAUSES: &[(&str, SeparationCause)] = &[
    ("renuncia voluntaria", SeparationCause::VoluntaryResignation),
    ("separacion voluntaria", SeparationCause::VoluntaryResignation),
    ("renuncia", SeparationCause::VoluntaryResignation),
    ("voluntaria", SeparationCause::VoluntaryResignation),
    ("despido injustificado", SeparationCause::UnjustifiedDismissal),
    ("despido justificado", SeparationCause::JustifiedDismissal),
    ("rescision", SeparationCause::JustifiedDismissal),
    ("abandono de empleo", SeparationCause::JustifiedDismissal),
    ("despido", SeparationCause::UnjustifiedDismissal),
    ("defuncion", SeparationCause::Death),
    ("fallecimiento", SeparationCause::Death),
    ("muerte", SeparationCause::Death),
    ("invalidez", SeparationCause::Disability),
    ("incapacidad", SeparationCause::Disability),
    ("jubilacion", SeparationCause::Retirement),
    ("pension", SeparationCause::Retirement),
    ("retiro", SeparationCause::Retirement),
    ("termino de contrato", SeparationCause::ContractEnd),
    ("fin de contrato", SeparationCause::ContractEnd),
    ("vencimiento de contrato", SeparationCause::ContractEnd),
    ("mutuo acuerdo", SeparationCause::MutualAgreement),
    ("convenio", SeparationCause::MutualAgreement),
];

pub fn parse_cause(text: &str) -> Option<SeparationCause> {
    match_label(text, CAUSES)
}

/// Seniority premium owed for `years` of service, or zero when not due.
pub fn seniority_premium(
    cause: SeparationCause,
    daily_salary: f64,
    years: f64,
    policy: &ValidationPolicy,
) -> f64 {
    if cause == SeparationCause::VoluntaryResignation && years < PREMIUM_RESIGNATION_YEARS {
        return 0.0;
    }
    let base = daily_salary.min(2.0 * policy.minimum_daily_wage);
    PREMIUM_DAYS_PER_YEAR * years * base
}

/// Indemnity owed on unjustified dismissal, or zero for other causes.
pub fn indemnity(cause: SeparationCause, integrated_salary: f64, years: f64) -> f64 {
    if cause != SeparationCause::UnjustifiedDismissal {
        return 0.0;
    }
    (INDEMNITY_BASE_DAYS + INDEMNITY_DAYS_PER_YEAR * years) * integrated_salary
}

fn short_of(paid: f64, owed: f64) -> bool {
    owed > 0.0 && paid < owed * (1.0 - PAYMENT_TOLERANCE)
}

/// Legal minimum for one record: `(premium, indemnity)`.
fn legal_minimum(
    record: &CanonicalRecord,
    cause: SeparationCause,
    policy: &ValidationPolicy,
) -> Option<(f64, f64)> {
    let hired = hire_date(record)?;
    let left = termination_date(record)?;
    if hired > left {
        return None;
    }
    let years = fractional_years(hired, left);
    let daily = effective_daily_salary(record).filter(|value| *value > 0.0)?;
    let integrated = record
        .number(CanonicalField::IntegratedSalary)
        .filter(|value| *value > 0.0)
        .unwrap_or(daily);
    Some((
        seniority_premium(cause, daily, years, policy),
        indemnity(cause, integrated, years),
    ))
}

pub struct SettlementValidator;

impl ValidatorUnit for SettlementValidator {
    fn name(&self) -> &'static str {
        "settlement_validator"
    }

    fn description(&self) -> &'static str {
        "Valida la causa de baja y compara los pagos con el mínimo legal"
    }

    fn priority(&self) -> u32 {
        18
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["termination_analyzer", "salary_validator"]
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let sheet = SheetKind::Terminated;
        let field = CanonicalField::TerminationCause.name();
        let policy = ctx.policy();
        let mapping = dataset.mapping(sheet);
        let records = sheet_records(dataset, sheet)?;
        let mut findings = Findings::new(self.name());
        if records.is_empty() {
            return Ok(findings.finish(field, "Sin bajas que liquidar"));
        }
        if !mapping.is_mapped(CanonicalField::TerminationCause) {
            return Ok(vec![
                Finding::warning(
                    self.name(),
                    field,
                    "La hoja de bajas no tiene columna de causa de baja; no se verificaron liquidaciones",
                )
                .with_suggestion("Agregue la columna 'Causa de baja'"),
            ]);
        }
        let payments_mapped = [
            CanonicalField::SettlementAmount,
            CanonicalField::SeniorityPremiumPaid,
            CanonicalField::IndemnityPaid,
        ]
        .into_iter()
        .any(|field| mapping.is_mapped(field));

        let mut unknown_cause = RowIssues::default();
        let mut negative = RowIssues::default();
        let mut premium_short = RowIssues::default();
        let mut indemnity_short = RowIssues::default();
        let mut total_short = RowIssues::default();
        let mut owed_total = 0.0;

        for record in records {
            for amount_field in [
                CanonicalField::SettlementAmount,
                CanonicalField::SeniorityPremiumPaid,
                CanonicalField::IndemnityPaid,
            ] {
                if let Some(amount) = record.number(amount_field)
                    && amount < 0.0
                {
                    negative.push(record.row, format!("{}: {amount:.2}", amount_field.label()));
                }
            }
            let Some(text) = record.text(CanonicalField::TerminationCause) else {
                continue;
            };
            let Some(cause) = parse_cause(&text) else {
                unknown_cause.push(record.row, text.into_owned());
                continue;
            };
            let Some((premium, indemnity)) = legal_minimum(record, cause, policy) else {
                continue;
            };
            owed_total += premium + indemnity;

            let premium_paid = record.number(CanonicalField::SeniorityPremiumPaid);
            let indemnity_paid = record.number(CanonicalField::IndemnityPaid);
            if let Some(paid) = premium_paid
                && short_of(paid, premium)
            {
                premium_short.push(record.row, format!("{paid:.2} < {premium:.2}"));
            }
            if let Some(paid) = indemnity_paid
                && short_of(paid, indemnity)
            {
                indemnity_short.push(record.row, format!("{paid:.2} < {indemnity:.2}"));
            }
            if premium_paid.is_none()
                && indemnity_paid.is_none()
                && let Some(paid) = record.number(CanonicalField::SettlementAmount)
                && short_of(paid, premium + indemnity)
            {
                let owed = premium + indemnity;
                total_short.push(record.row, format!("{paid:.2} < {owed:.2}"));
            }
        }

        let count = unknown_cause.len();
        findings.push_opt(unknown_cause.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                field,
                format!("{} con causa de baja no reconocida", records_phrase(count)),
            )
            .with_suggestion(
                "Use causas como renuncia voluntaria, despido injustificado, defunción o jubilación",
            ),
        ));
        let count = negative.len();
        findings.push_opt(negative.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                CanonicalField::SettlementAmount.name(),
                format!("{} con montos pagados negativos", records_phrase(count)),
            ),
        ));
        let count = premium_short.len();
        findings.push_opt(premium_short.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                CanonicalField::SeniorityPremiumPaid.name(),
                format!("{} con prima de antigüedad pagada menor a la legal (art. 162 LFT)", records_phrase(count)),
            ),
        ));
        let count = indemnity_short.len();
        findings.push_opt(indemnity_short.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                CanonicalField::IndemnityPaid.name(),
                format!("{} con indemnización pagada menor a la legal (arts. 48 y 50 LFT)", records_phrase(count)),
            ),
        ));
        let count = total_short.len();
        findings.push_opt(total_short.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                CanonicalField::SettlementAmount.name(),
                format!("{} con liquidación menor al mínimo legal estimado", records_phrase(count)),
            )
            .with_suggestion("Separe prima de antigüedad e indemnización para una comparación precisa"),
        ));
        if !payments_mapped {
            findings.push(
                Finding::info(
                    self.name(),
                    CanonicalField::SettlementAmount.name(),
                    format!("Sin columnas de montos pagados; mínimo legal estimado {owed_total:.2}"),
                )
                .with_metadata(json!({ "estimatedLegalMinimum": owed_total })),
            );
        }
        Ok(findings.finish(field, "Causas de baja reconocidas y pagos conforme al mínimo legal"))
    }
}
