//! Static header synonym table.
//!
//! Versioned together with the validator rule set. Entries are ordered: when
//! two synonyms of the same field give the same score, the earlier one is
//! reported as the match.

use std::collections::BTreeMap;

use censo_model::CanonicalField;

use crate::error::{MapError, Result};
use crate::utils::normalize_text;

/// Version of the bundled synonym table.
pub const SYNONYM_TABLE_VERSION: &str = "2024.1";

/// Canonical field to ordered, normalized header variants.
#[derive(Debug, Clone)]
pub struct FieldSynonymTable {
    version: String,
    entries: BTreeMap<CanonicalField, Vec<String>>,
}

impl FieldSynonymTable {
    /// Builds a table from raw variants, normalizing each one.
    ///
    /// Fails when a field ends up without any usable variant.
    pub fn from_entries<I, S>(version: impl Into<String>, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (CanonicalField, Vec<S>)>,
        S: AsRef<str>,
    {
        let mut table = BTreeMap::new();
        for (field, variants) in entries {
            let mut normalized: Vec<String> = Vec::new();
            for variant in variants {
                let text = normalize_text(variant.as_ref());
                if !text.is_empty() && !normalized.contains(&text) {
                    normalized.push(text);
                }
            }
            if normalized.is_empty() {
                return Err(MapError::InvalidSynonymTable {
                    field,
                    reason: "no non-empty header variants".to_string(),
                });
            }
            table.insert(field, normalized);
        }
        Ok(Self {
            version: version.into(),
            entries: table,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn synonyms(&self, field: CanonicalField) -> &[String] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fields in catalogue order that have at least one synonym.
    pub fn fields(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        CanonicalField::ALL
            .into_iter()
            .filter(|field| self.entries.contains_key(field))
    }
}

impl Default for FieldSynonymTable {
    fn default() -> Self {
        let entries = default_entries()
            .into_iter()
            .map(|(field, variants)| {
                let normalized = variants
                    .iter()
                    .map(|variant| normalize_text(variant))
                    .collect::<Vec<_>>();
                (field, normalized)
            })
            .collect();
        Self {
            version: SYNONYM_TABLE_VERSION.to_string(),
            entries,
        }
    }
}

fn default_entries() -> Vec<(CanonicalField, Vec<&'static str>)> {
    vec![
        (
            CanonicalField::EmployeeId,
            vec![
                "numero de empleado",
                "numero empleado",
                "num empleado",
                "no empleado",
                "no de empleado",
                "clave de empleado",
                "clave empleado",
                "id empleado",
                "numero de nomina",
                "ficha",
                "employee id",
            ],
        ),
        (
            CanonicalField::FullName,
            vec![
                "nombre",
                "nombre completo",
                "nombre del empleado",
                "nombre del trabajador",
                "apellidos y nombre",
                "nombre y apellidos",
                "empleado",
                "trabajador",
            ],
        ),
        (
            CanonicalField::Rfc,
            vec!["rfc", "r f c", "registro federal de contribuyentes"],
        ),
        (
            CanonicalField::Curp,
            vec!["curp", "clave unica de registro de poblacion"],
        ),
        (
            CanonicalField::Nss,
            vec![
                "nss",
                "numero de seguro social",
                "no seguro social",
                "seguro social",
                "numero imss",
                "afiliacion imss",
                "imss",
            ],
        ),
        (CanonicalField::Gender, vec!["sexo", "genero", "gender"]),
        (
            CanonicalField::BirthDate,
            vec![
                "fecha de nacimiento",
                "fecha nacimiento",
                "f nacimiento",
                "fec nac",
                "fecha nac",
                "nacimiento",
            ],
        ),
        (
            CanonicalField::HireDate,
            vec![
                "fecha de ingreso",
                "fecha ingreso",
                "f ingreso",
                "fec ing",
                "fecha de alta",
                "fecha alta",
                "fecha de contratacion",
                "fecha de antiguedad",
                "ingreso",
            ],
        ),
        (
            CanonicalField::DailySalary,
            vec![
                "salario diario",
                "sueldo diario",
                "salario diario nominal",
                "cuota diaria",
                "salario base",
                "sd",
            ],
        ),
        (
            CanonicalField::IntegratedSalary,
            vec![
                "salario diario integrado",
                "sueldo diario integrado",
                "salario integrado",
                "salario base de cotizacion",
                "sdi",
                "s d i",
                "sbc",
            ],
        ),
        (
            CanonicalField::MonthlySalary,
            vec![
                "sueldo mensual",
                "salario mensual",
                "sueldo base mensual",
                "percepcion mensual",
                "sueldo",
            ],
        ),
        (
            CanonicalField::Position,
            vec![
                "puesto",
                "nombre del puesto",
                "descripcion del puesto",
                "cargo",
                "posicion",
                "categoria",
            ],
        ),
        (
            CanonicalField::Department,
            vec!["departamento", "depto", "area", "gerencia", "centro de costos"],
        ),
        (
            CanonicalField::EmployeeType,
            vec![
                "tipo de personal",
                "tipo de empleado",
                "tipo de trabajador",
                "tipo de contrato",
                "sindicalizado",
                "confianza sindicalizado",
            ],
        ),
        (
            CanonicalField::TerminationDate,
            vec![
                "fecha de baja",
                "fecha baja",
                "fecha de terminacion",
                "fecha de separacion",
                "fecha de salida",
                "fecha de egreso",
                "baja",
            ],
        ),
        (
            CanonicalField::TerminationCause,
            vec![
                "causa de baja",
                "motivo de baja",
                "tipo de baja",
                "motivo de separacion",
                "causa de terminacion",
                "causa",
                "motivo",
            ],
        ),
        (
            CanonicalField::SettlementAmount,
            vec![
                "monto pagado",
                "importe pagado",
                "total pagado",
                "monto total pagado",
                "monto de liquidacion",
                "monto finiquito",
                "finiquito",
                "liquidacion",
            ],
        ),
        (
            CanonicalField::SeniorityPremiumPaid,
            vec![
                "prima de antiguedad",
                "prima de antiguedad pagada",
                "prima antiguedad",
            ],
        ),
        (
            CanonicalField::IndemnityPaid,
            vec![
                "indemnizacion",
                "indemnizacion pagada",
                "indemnizacion constitucional",
                "tres meses",
            ],
        ),
    ]
}
