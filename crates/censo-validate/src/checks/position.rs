//! Position classification: directive, confidence, unionized, operative.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use censo_model::{CanonicalField, CanonicalRecord, Finding, MappedDataset, SheetKind};

use super::{Findings, RowIssues, records_phrase, sheet_records};
use crate::error::UnitError;
use crate::unit::{UnitContext, ValidatorUnit};
use crate::util::match_label;

/// Share of unclassified positions above which the result is a warning.
const UNCLASSIFIED_WARNING_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PositionClass {
    Directive,
    Confidence,
    Unionized,
    Operative,
}

impl PositionClass {
    pub fn label(self) -> &'static str {
        match self {
            Self::Directive => "directivos",
            Self::Confidence => "de confianza",
            Self::Unionized => "sindicalizados",
            Self::Operative => "operativos",
        }
    }
}

/// Contract category declared in the employee-type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeType {
    Unionized,
    Confidence,
    Temporary,
}

const EMPLOYEE_TYPES: &[(&str, EmployeeType)] = &[
    ("no sindicalizado", EmployeeType::Confidence),
    ("sindicalizado", EmployeeType::Unionized),
    ("sindicalizada", EmployeeType::Unionized),
    ("sindical", EmployeeType::Unionized),
    ("sind", EmployeeType::Unionized),
    ("s", EmployeeType::Unionized),
    ("confianza", EmployeeType::Confidence),
    ("c", EmployeeType::Confidence),
    ("eventual", EmployeeType::Temporary),
    ("temporal", EmployeeType::Temporary),
    ("por obra", EmployeeType::Temporary),
    ("honorarios", EmployeeType::Temporary),
];

const POSITION_KEYWORDS: &[(&str, PositionClass)] = &[
    ("director", PositionClass::Directive),
    ("directora", PositionClass::Directive),
    ("subdirector", PositionClass::Directive),
    ("subdirectora", PositionClass::Directive),
    ("gerente", PositionClass::Directive),
    ("presidente", PositionClass::Directive),
    ("vicepresidente", PositionClass::Directive),
    ("ceo", PositionClass::Directive),
    ("cfo", PositionClass::Directive),
    ("coo", PositionClass::Directive),
    ("jefe", PositionClass::Confidence),
    ("jefa", PositionClass::Confidence),
    ("coordinador", PositionClass::Confidence),
    ("coordinadora", PositionClass::Confidence),
    ("supervisor", PositionClass::Confidence),
    ("supervisora", PositionClass::Confidence),
    ("administrador", PositionClass::Confidence),
    ("contador", PositionClass::Confidence),
    ("analista", PositionClass::Confidence),
    ("ejecutivo", PositionClass::Confidence),
    ("asesor", PositionClass::Confidence),
    ("ingeniero", PositionClass::Confidence),
    ("abogado", PositionClass::Confidence),
    ("especialista", PositionClass::Confidence),
    ("operador", PositionClass::Operative),
    ("operadora", PositionClass::Operative),
    ("obrero", PositionClass::Operative),
    ("ayudante", PositionClass::Operative),
    ("auxiliar", PositionClass::Operative),
    ("almacenista", PositionClass::Operative),
    ("chofer", PositionClass::Operative),
    ("intendente", PositionClass::Operative),
    ("vigilante", PositionClass::Operative),
    ("tecnico", PositionClass::Operative),
    ("montacarguista", PositionClass::Operative),
    ("empacador", PositionClass::Operative),
    ("cajero", PositionClass::Operative),
    ("cocinero", PositionClass::Operative),
    ("limpieza", PositionClass::Operative),
];

pub fn parse_employee_type(text: &str) -> Option<EmployeeType> {
    match_label(text, EMPLOYEE_TYPES)
}

/// Class of a position title alone.
pub fn classify_position(title: &str) -> Option<PositionClass> {
    match_label(title, POSITION_KEYWORDS)
}

/// Class of a record: unionized staff outside management are `Unionized`.
pub fn classify_record(record: &CanonicalRecord) -> Option<PositionClass> {
    let by_title = record
        .text(CanonicalField::Position)
        .and_then(|title| classify_position(&title));
    let unionized = record
        .text(CanonicalField::EmployeeType)
        .and_then(|text| parse_employee_type(&text))
        == Some(EmployeeType::Unionized);
    match by_title {
        Some(PositionClass::Directive) => Some(PositionClass::Directive),
        _ if unionized => Some(PositionClass::Unionized),
        other => other,
    }
}

pub struct PositionClassifier;

impl ValidatorUnit for PositionClassifier {
    fn name(&self) -> &'static str {
        "position_classifier"
    }

    fn description(&self) -> &'static str {
        "Clasifica los puestos en directivos, confianza, sindicalizados y operativos"
    }

    fn priority(&self) -> u32 {
        14
    }

    fn validate(
        &self,
        dataset: &MappedDataset,
        _ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError> {
        let sheet = SheetKind::Active;
        let field = CanonicalField::Position.name();
        let mut findings = Findings::new(self.name());
        if !dataset.mapping(sheet).is_mapped(CanonicalField::Position) {
            return Ok(findings.finish(field, "Sin columna de puesto; no se clasificó al personal"));
        }

        let records = sheet_records(dataset, sheet)?;
        let mut counts: BTreeMap<PositionClass, usize> = BTreeMap::new();
        let mut unclassified = RowIssues::default();
        for record in records {
            let Some(title) = record.text(CanonicalField::Position) else {
                continue;
            };
            match classify_record(record) {
                Some(class) => *counts.entry(class).or_insert(0) += 1,
                None => unclassified.push(record.row, title.into_owned()),
            }
        }

        let classified: usize = counts.values().sum();
        let total = classified + unclassified.len();
        if total == 0 {
            return Ok(findings.finish(field, "No hay puestos capturados"));
        }
        let summary = counts
            .iter()
            .map(|(class, count)| format!("{count} {}", class.label()))
            .collect::<Vec<_>>()
            .join(", ");
        findings.push(
            Finding::success(
                self.name(),
                field,
                format!("Clasificación de puestos: {summary}"),
            )
            .with_metadata(json!({ "classes": counts, "unclassified": unclassified.len() })),
        );

        let count = unclassified.len();
        let share = count as f64 / total as f64;
        let finding = if share > UNCLASSIFIED_WARNING_RATIO {
            Finding::warning(
                self.name(),
                field,
                format!("{} con puesto no clasificable ({:.0}%)", records_phrase(count), share * 100.0),
            )
            .with_suggestion("Agregue la columna 'Tipo de personal' para distinguir confianza y sindicalizados")
        } else {
            Finding::info(
                self.name(),
                field,
                format!("{} con puesto no clasificable", records_phrase(count)),
            )
        };
        findings.push_opt(unclassified.into_finding(sheet, finding));
        Ok(findings.finish(field, "Todos los puestos fueron clasificados"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::{active, context, dataset};
    use censo_model::Severity;

    #[test]
    fn classifies_titles() {
        assert_eq!(classify_position("Director General"), Some(PositionClass::Directive));
        assert_eq!(classify_position("Subdirector de Finanzas"), Some(PositionClass::Directive));
        assert_eq!(classify_position("Jefe de Almacén"), Some(PositionClass::Confidence));
        assert_eq!(classify_position("Auxiliar contable"), Some(PositionClass::Operative));
        assert_eq!(classify_position("Técnico"), Some(PositionClass::Operative));
        assert_eq!(classify_position("Becario"), None);
    }

    #[test]
    fn employee_type_overrides_non_directive_titles() {
        let record = active(
            2,
            &[
                (CanonicalField::Position, "Operador"),
                (CanonicalField::EmployeeType, "Sindicalizado"),
            ],
        );
        assert_eq!(classify_record(&record), Some(PositionClass::Unionized));
        assert_eq!(parse_employee_type("No sindicalizado"), Some(EmployeeType::Confidence));
    }

    #[test]
    fn reports_distribution_and_unclassified() {
        let data = dataset(
            vec![
                active(2, &[(CanonicalField::Position, "Gerente de Ventas")]),
                active(3, &[(CanonicalField::Position, "Operador")]),
                active(4, &[(CanonicalField::Position, "Becario")]),
            ],
            vec![],
        );
        let findings = PositionClassifier.validate(&data, &context()).unwrap();
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("1 directivos"));
        assert_eq!(findings[1].severity, Severity::Warning);
        assert_eq!(findings[1].rows, vec![4]);
    }
}
