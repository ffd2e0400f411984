//! Canonical field catalogue.
//!
//! Every header that the column mapper recognizes binds to one of these
//! fields. The set is closed: anything else lands in a record's unmapped
//! side table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// How a field's raw value is coerced during row conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Trimmed text.
    Text,
    /// Currency symbols and thousands separators stripped, then parsed.
    Number,
    /// Left opaque; validators parse it.
    Date,
    /// May hold a date or a government identifier; left verbatim.
    Mixed,
}

/// Which sheet(s) a field is meaningful for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Applicability {
    Active,
    Terminated,
    Both,
}

impl Applicability {
    pub fn applies_to(self, sheet: SheetKind) -> bool {
        match self {
            Self::Both => true,
            Self::Active => sheet == SheetKind::Active,
            Self::Terminated => sheet == SheetKind::Terminated,
        }
    }
}

/// The two record flavors of a census.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    Active,
    Terminated,
}

impl SheetKind {
    pub const ALL: [SheetKind; 2] = [SheetKind::Active, SheetKind::Terminated];

    /// Spanish label used in finding messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "personal activo",
            Self::Terminated => "bajas",
        }
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Terminated => f.write_str("terminated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    EmployeeId,
    FullName,
    Rfc,
    Curp,
    Nss,
    Gender,
    BirthDate,
    HireDate,
    DailySalary,
    IntegratedSalary,
    MonthlySalary,
    Position,
    Department,
    EmployeeType,
    TerminationDate,
    TerminationCause,
    SettlementAmount,
    SeniorityPremiumPaid,
    IndemnityPaid,
}

impl CanonicalField {
    /// Catalogue order. Mapping ties between fields resolve in this order.
    pub const ALL: [CanonicalField; 19] = [
        Self::EmployeeId,
        Self::FullName,
        Self::Rfc,
        Self::Curp,
        Self::Nss,
        Self::Gender,
        Self::BirthDate,
        Self::HireDate,
        Self::DailySalary,
        Self::IntegratedSalary,
        Self::MonthlySalary,
        Self::Position,
        Self::Department,
        Self::EmployeeType,
        Self::TerminationDate,
        Self::TerminationCause,
        Self::SettlementAmount,
        Self::SeniorityPremiumPaid,
        Self::IndemnityPaid,
    ];

    /// Wire name (camelCase), also used as the finding field label.
    pub fn name(self) -> &'static str {
        match self {
            Self::EmployeeId => "employeeId",
            Self::FullName => "fullName",
            Self::Rfc => "rfc",
            Self::Curp => "curp",
            Self::Nss => "nss",
            Self::Gender => "gender",
            Self::BirthDate => "birthDate",
            Self::HireDate => "hireDate",
            Self::DailySalary => "dailySalary",
            Self::IntegratedSalary => "integratedSalary",
            Self::MonthlySalary => "monthlySalary",
            Self::Position => "position",
            Self::Department => "department",
            Self::EmployeeType => "employeeType",
            Self::TerminationDate => "terminationDate",
            Self::TerminationCause => "terminationCause",
            Self::SettlementAmount => "settlementAmount",
            Self::SeniorityPremiumPaid => "seniorityPremiumPaid",
            Self::IndemnityPaid => "indemnityPaid",
        }
    }

    /// Human label in the census language.
    pub fn label(self) -> &'static str {
        match self {
            Self::EmployeeId => "Número de empleado",
            Self::FullName => "Nombre",
            Self::Rfc => "RFC",
            Self::Curp => "CURP",
            Self::Nss => "NSS",
            Self::Gender => "Sexo",
            Self::BirthDate => "Fecha de nacimiento",
            Self::HireDate => "Fecha de ingreso",
            Self::DailySalary => "Salario diario",
            Self::IntegratedSalary => "Salario diario integrado",
            Self::MonthlySalary => "Sueldo mensual",
            Self::Position => "Puesto",
            Self::Department => "Departamento",
            Self::EmployeeType => "Tipo de personal",
            Self::TerminationDate => "Fecha de baja",
            Self::TerminationCause => "Causa de baja",
            Self::SettlementAmount => "Monto pagado",
            Self::SeniorityPremiumPaid => "Prima de antigüedad pagada",
            Self::IndemnityPaid => "Indemnización pagada",
        }
    }

    pub fn field_type(self) -> FieldType {
        match self {
            Self::BirthDate => FieldType::Mixed,
            Self::HireDate | Self::TerminationDate => FieldType::Date,
            Self::DailySalary
            | Self::IntegratedSalary
            | Self::MonthlySalary
            | Self::SettlementAmount
            | Self::SeniorityPremiumPaid
            | Self::IndemnityPaid => FieldType::Number,
            _ => FieldType::Text,
        }
    }

    pub fn applicability(self) -> Applicability {
        match self {
            Self::TerminationDate
            | Self::TerminationCause
            | Self::SettlementAmount
            | Self::SeniorityPremiumPaid
            | Self::IndemnityPaid => Applicability::Terminated,
            _ => Applicability::Both,
        }
    }

    /// Fields in catalogue order that apply to `sheet`.
    pub fn for_sheet(sheet: SheetKind) -> impl Iterator<Item = CanonicalField> {
        Self::ALL
            .into_iter()
            .filter(move |field| field.applicability().applies_to(sheet))
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CanonicalField {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for field in CanonicalField::ALL {
            assert_eq!(field.name().parse::<CanonicalField>().unwrap(), field);
        }
        assert!("salary".parse::<CanonicalField>().is_err());
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_string(&CanonicalField::IntegratedSalary).unwrap();
        assert_eq!(json, "\"integratedSalary\"");
    }

    #[test]
    fn termination_fields_only_apply_to_terminations() {
        let active: Vec<_> = CanonicalField::for_sheet(SheetKind::Active).collect();
        assert!(!active.contains(&CanonicalField::TerminationDate));
        let terminated: Vec<_> = CanonicalField::for_sheet(SheetKind::Terminated).collect();
        assert!(terminated.contains(&CanonicalField::TerminationDate));
        assert!(terminated.contains(&CanonicalField::HireDate));
    }
}
