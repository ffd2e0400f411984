//! Business-rule parameters shared by every validator unit.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use censo_model::{CanonicalField, Severity};

use crate::error::UnitError;

/// Severity assigned to duplicated values of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRule {
    pub field: CanonicalField,
    pub severity: Severity,
}

impl DuplicateRule {
    pub fn new(field: CanonicalField, severity: Severity) -> Self {
        Self { field, severity }
    }
}

/// Thresholds and legal constants used by the validator units.
///
/// Defaults reflect 2024 Mexican values: general-zone minimum wage and UMA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub valuation_date: NaiveDate,
    pub minimum_daily_wage: f64,
    pub uma_daily: f64,
    pub contribution_ceiling_umas: f64,
    pub minimum_working_age: u32,
    pub maximum_age: u32,
    pub minimum_integration_factor: f64,
    pub salary_outlier_iqr_factor: f64,
    pub completeness_warning_ratio: f64,
    pub duplicates: Vec<DuplicateRule>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            valuation_date: Local::now().date_naive(),
            minimum_daily_wage: 248.93,
            uma_daily: 108.57,
            contribution_ceiling_umas: 25.0,
            minimum_working_age: 15,
            maximum_age: 100,
            minimum_integration_factor: 1.0493,
            salary_outlier_iqr_factor: 3.0,
            completeness_warning_ratio: 0.95,
            duplicates: default_duplicate_rules(),
        }
    }
}

/// Government identifiers are critical; the payroll key only warns.
pub fn default_duplicate_rules() -> Vec<DuplicateRule> {
    vec![
        DuplicateRule::new(CanonicalField::Rfc, Severity::Critical),
        DuplicateRule::new(CanonicalField::Curp, Severity::Critical),
        DuplicateRule::new(CanonicalField::Nss, Severity::Critical),
        DuplicateRule::new(CanonicalField::EmployeeId, Severity::Warning),
    ]
}

impl ValidationPolicy {
    /// Policy with the given valuation date and default thresholds.
    pub fn for_valuation(valuation_date: NaiveDate) -> Self {
        Self {
            valuation_date,
            ..Self::default()
        }
    }

    /// Daily integrated salary above which contributions are capped.
    pub fn contribution_ceiling(&self) -> f64 {
        self.uma_daily * self.contribution_ceiling_umas
    }

    /// Severity configured for duplicates of `field`, if it is checked at all.
    pub fn duplicate_severity(&self, field: CanonicalField) -> Option<Severity> {
        self.duplicates
            .iter()
            .find(|rule| rule.field == field)
            .map(|rule| rule.severity)
    }

    pub fn validate(&self) -> Result<(), UnitError> {
        let positive = [
            ("minimum_daily_wage", self.minimum_daily_wage),
            ("uma_daily", self.uma_daily),
            ("contribution_ceiling_umas", self.contribution_ceiling_umas),
            ("minimum_integration_factor", self.minimum_integration_factor),
            ("salary_outlier_iqr_factor", self.salary_outlier_iqr_factor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(UnitError::InvalidPolicy(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.minimum_working_age >= self.maximum_age {
            return Err(UnitError::InvalidPolicy(format!(
                "minimum_working_age ({}) must be below maximum_age ({})",
                self.minimum_working_age, self.maximum_age
            )));
        }
        if !(self.completeness_warning_ratio > 0.0 && self.completeness_warning_ratio <= 1.0) {
            return Err(UnitError::InvalidPolicy(format!(
                "completeness_warning_ratio must be in (0, 1], got {}",
                self.completeness_warning_ratio
            )));
        }
        let mut seen = Vec::new();
        for rule in &self.duplicates {
            if seen.contains(&rule.field) {
                return Err(UnitError::InvalidPolicy(format!(
                    "duplicate rule for {} is declared twice",
                    rule.field
                )));
            }
            seen.push(rule.field);
        }
        Ok(())
    }
}
