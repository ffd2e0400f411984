//! Required columns, fill ratios and unmapped-column hints.

use serde_json::json;

use censo_model::{
    CanonicalField, Finding, MappedDataset, ProgressLevel, SheetKind, SheetMapping,
};

use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::unit::{UnitContext, ValidatorUnit};

/// How much a missing column matters for a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Need {
    Required,
    Recommended,
    Optional,
}

const ACTIVE_FIELDS: &[(CanonicalField, Need)] = &[
    (CanonicalField::HireDate, Need::Required),
    (CanonicalField::DailySalary, Need::Required),
    (CanonicalField::EmployeeId, Need::Recommended),
    (CanonicalField::Gender, Need::Recommended),
    (CanonicalField::IntegratedSalary, Need::Recommended),
    (CanonicalField::FullName, Need::Optional),
    (CanonicalField::Nss, Need::Optional),
    (CanonicalField::Position, Need::Optional),
    (CanonicalField::EmployeeType, Need::Optional),
];

const TERMINATED_FIELDS: &[(CanonicalField, Need)] = &[
    (CanonicalField::TerminationDate, Need::Required),
    (CanonicalField::HireDate, Need::Recommended),
    (CanonicalField::TerminationCause, Need::Recommended),
    (CanonicalField::DailySalary, Need::Recommended),
    (CanonicalField::SettlementAmount, Need::Optional),
];

/// Sources of a birth date: the column itself or an identifier embedding it.
const BIRTH_SOURCES: [CanonicalField; 3] = [
    CanonicalField::BirthDate,
    CanonicalField::Curp,
    CanonicalField::Rfc,
];

pub struct CompletenessAuditor;

impl ValidatorUnit for CompletenessAuditor {
    fn name(&self) -> &'static str {
        "completeness_auditor"
    }

    fn description(&self) -> &'static str {
        "Verifica columnas obligatorias, porcentaje de llenado y columnas no reconocidas"
    }

    fn priority(&self) -> u32 {
        1
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        ctx.progress(
            ProgressLevel::Info,
            &format!(
                "Auditando completitud de {}",
                records_phrase(dataset.total_records())
            ),
        );
        let mut findings = Findings::new(self.name());

        self.check_birth_sources(dataset, &mut findings);
        for sheet in SheetKind::ALL {
            let records = sheet_records(dataset, sheet)?;
            if records.is_empty() {
                continue;
            }
            let mapping = dataset.mapping(sheet);
            let fields = match sheet {
                SheetKind::Active => ACTIVE_FIELDS,
                SheetKind::Terminated => TERMINATED_FIELDS,
            };
            for (field, need) in fields {
                if !mapping.is_mapped(*field) {
                    findings.push_opt(self.missing_column(sheet, *field, *need));
                }
            }
            self.check_fill_ratios(dataset, sheet, ctx, &mut findings)?;
            self.check_coercion_failures(mapping, &mut findings);
            self.check_unmapped(mapping, &mut findings);
        }

        Ok(findings.finish(
            "dataset",
            "Todas las columnas obligatorias están presentes y completas",
        ))
    }
}

impl CompletenessAuditor {
    fn check_birth_sources(&self, dataset: &MappedDataset, findings: &mut Findings) {
        let mapping = &dataset.active_mapping;
        if dataset.active.is_empty() || mapping.is_mapped(CanonicalField::BirthDate) {
            return;
        }
        let fallback: Vec<_> = BIRTH_SOURCES[1..]
            .iter()
            .filter(|field| mapping.is_mapped(**field))
            .collect();
        match fallback.first() {
            Some(field) => findings.push(
                Finding::info(
                    self.name(),
                    CanonicalField::BirthDate.name(),
                    format!(
                        "No hay columna de fecha de nacimiento; se extraerá del {}",
                        field.label()
                    ),
                )
                .with_suggestion("Incluya la fecha de nacimiento explícita para mayor precisión"),
            ),
            None => findings.push(
                Finding::critical(
                    self.name(),
                    CanonicalField::BirthDate.name(),
                    "No se encontró fecha de nacimiento, RFC ni CURP en el personal activo",
                )
                .with_suggestion(
                    "Agregue una columna 'Fecha de nacimiento' o el RFC/CURP de cada empleado",
                ),
            ),
        }
    }

    fn missing_column(&self, sheet: SheetKind, field: CanonicalField, need: Need) -> Option<Finding> {
        let message = format!(
            "No se encontró la columna '{}' en {}",
            field.label(),
            sheet.label()
        );
        let suggestion = format!("Agregue o renombre la columna como '{}'", field.label());
        let finding = match need {
            Need::Required => Finding::critical(self.name(), field.name(), message),
            Need::Recommended => Finding::warning(self.name(), field.name(), message),
            Need::Optional => return None,
        };
        Some(finding.with_suggestion(suggestion))
    }

    fn check_fill_ratios(
        &self,
        dataset: &MappedDataset,
        sheet: SheetKind,
        ctx: &UnitContext,
        findings: &mut Findings,
    ) -> Result<(), UnitError> {
        let records = sheet_records(dataset, sheet)?;
        let mapping = dataset.mapping(sheet);
        let threshold = ctx.policy().completeness_warning_ratio;
        for binding in &mapping.bindings {
            let mut missing = RowIssues::default();
            for record in records {
                if record.text(binding.field).is_none() && record.number(binding.field).is_none() {
                    missing.push(record.row, "");
                }
            }
            let filled = records.len() - missing.len();
            let ratio = filled as f64 / records.len() as f64;
            if ratio >= threshold {
                continue;
            }
            let message = format!(
                "La columna '{}' está llena en {:.1}% de {} ({} vacíos)",
                binding.header,
                ratio * 100.0,
                sheet.label(),
                missing.len()
            );
            let finding = Finding::warning(self.name(), binding.field.name(), message)
                .with_suggestion("Complete los valores faltantes antes de la valuación");
            findings.push_opt(missing.into_finding(sheet, finding).map(|finding| {
                let mut metadata = finding.metadata.clone().unwrap_or_else(|| json!({}));
                metadata["fillRatio"] = json!(ratio);
                finding.with_metadata(metadata)
            }));
        }
        Ok(())
    }

    fn check_coercion_failures(&self, mapping: &SheetMapping, findings: &mut Findings) {
        for (field, rows) in &mapping.coercion_failures {
            let finding = Finding::warning(
                self.name(),
                field.name(),
                format!(
                    "{} con valores no numéricos en '{}' de {}",
                    records_phrase(rows.len()),
                    field.label(),
                    mapping.sheet.label()
                ),
            )
            .with_suggestion("Elimine símbolos o texto de las columnas de importes")
            .with_rows(mapping.sheet, rows.clone());
            findings.push(finding);
        }
    }

    fn check_unmapped(&self, mapping: &SheetMapping, findings: &mut Findings) {
        for column in &mapping.unmapped {
            let Some(nearest) = column.nearest else {
                continue;
            };
            findings.push(
                Finding::info(
                    self.name(),
                    nearest.name(),
                    format!(
                        "La columna '{}' de {} no se reconoció; se conserva como {}",
                        column.header,
                        mapping.sheet.label(),
                        column.key
                    ),
                )
                .with_suggestion(format!(
                    "¿Corresponde a '{}'? Renómbrela para que se valide",
                    nearest.label()
                ))
                .with_metadata(json!({
                    "column": column.column,
                    "similarity": column.similarity,
                })),
            );
        }
    }
}
