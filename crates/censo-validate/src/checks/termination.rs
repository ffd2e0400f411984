//! Termination dates of the terminated sheet.

use chrono::NaiveDate;
use serde_json::json;

use censo_model::{CanonicalField, CanonicalRecord, Finding, MappedDataset, SheetKind};

use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::unit::{UnitContext, ValidatorUnit};
use crate::util::parse_date;

const FIELD: CanonicalField = CanonicalField::TerminationDate;

/// Parsed termination date of a record, if readable.
pub(crate) fn termination_date(record: &CanonicalRecord) -> Option<NaiveDate> {
    record.raw(FIELD).and_then(parse_date)
}

pub(crate) fn hire_date(record: &CanonicalRecord) -> Option<NaiveDate> {
    record.raw(CanonicalField::HireDate).and_then(parse_date)
}

pub struct TerminationAnalyzer;

impl ValidatorUnit for TerminationAnalyzer {
    fn name(&self) -> &'static str {
        "termination_analyzer"
    }

    fn description(&self) -> &'static str {
        "Valida las fechas de baja contra el ingreso y la fecha de valuación"
    }

    fn priority(&self) -> u32 {
        17
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["hire_date_validator"]
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let sheet = SheetKind::Terminated;
        let valuation = ctx.valuation_date();
        let records = sheet_records(dataset, sheet)?;
        let mut findings = Findings::new(self.name());
        if records.is_empty() {
            return Ok(findings.finish(FIELD.name(), "Sin bajas registradas"));
        }
        if !dataset.mapping(sheet).is_mapped(FIELD) {
            return Ok(vec![
                Finding::critical(
                    self.name(),
                    FIELD.name(),
                    "La hoja de bajas no tiene columna de fecha de baja",
                )
                .with_suggestion("Agregue la columna 'Fecha de baja'"),
            ]);
        }

        let mut missing = RowIssues::default();
        let mut unreadable = RowIssues::default();
        let mut before_hire = RowIssues::default();
        let mut after_valuation = RowIssues::default();
        let mut earliest: Option<NaiveDate> = None;
        let mut latest: Option<NaiveDate> = None;

        for record in records {
            let Some(raw) = record.raw(FIELD).filter(|cell| !cell.is_blank()) else {
                missing.push(record.row, "");
                continue;
            };
            let Some(left) = parse_date(raw) else {
                unreadable.push(record.row, raw.as_text().into_owned());
                continue;
            };
            earliest = Some(earliest.map_or(left, |date| date.min(left)));
            latest = Some(latest.map_or(left, |date| date.max(left)));
            if let Some(hired) = hire_date(record)
                && hired > left
            {
                before_hire.push(record.row, format!("{hired} > {left}"));
            }
            if left > valuation {
                after_valuation.push(record.row, left.to_string());
            }
        }

        let count = missing.len();
        findings.push_opt(missing.into_finding(
            sheet,
            Finding::critical(
                self.name(),
                FIELD.name(),
                format!("{} de bajas sin fecha de baja", records_phrase(count)),
            ),
        ));
        let count = unreadable.len();
        findings.push_opt(unreadable.into_finding(
            sheet,
            Finding::critical(
                self.name(),
                FIELD.name(),
                format!("{} con fecha de baja no interpretable", records_phrase(count)),
            )
            .with_suggestion("Use el formato DD/MM/AAAA"),
        ));
        let count = before_hire.len();
        findings.push_opt(before_hire.into_finding(
            sheet,
            Finding::critical(
                self.name(),
                FIELD.name(),
                format!("{} con fecha de ingreso posterior a la fecha de baja", records_phrase(count)),
            )
            .with_suggestion("Verifique que las fechas de ingreso y baja no estén invertidas"),
        ));
        let count = after_valuation.len();
        findings.push_opt(after_valuation.into_finding(
            sheet,
            Finding::warning(
                self.name(),
                FIELD.name(),
                format!("{} con fecha de baja posterior a la fecha de valuación", records_phrase(count)),
            ),
        ));

        if findings.is_empty()
            && let (Some(earliest), Some(latest)) = (earliest, latest)
        {
            findings.push(
                Finding::success(
                    self.name(),
                    FIELD.name(),
                    format!(
                        "{} bajas válidas entre {earliest} y {latest}",
                        records.len()
                    ),
                )
                .with_metadata(json!({ "earliest": earliest, "latest": latest })),
            );
        }
        Ok(findings.finish(FIELD.name(), "Fechas de baja válidas"))
    }
}
