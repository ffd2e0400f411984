//! Validator findings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;
use crate::field::SheetKind;

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the valuation: `canProceed` turns false.
    Critical,
    /// Should be reviewed by the actuary.
    Warning,
    /// Observation or confirmation.
    Info,
}

impl Severity {
    /// Higher ranks sort first in ranked presentations.
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 3,
            Self::Warning => 2,
            Self::Info => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" | "critico" | "crítico" => Ok(Self::Critical),
            "warning" | "high" | "advertencia" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            other => Err(ModelError::UnknownSeverity(other.to_string())),
        }
    }
}

/// Outcome flavor shown next to a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStatus {
    Success,
    Warning,
    Error,
}

/// One observation from a validator unit. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub validator: String,
    /// Canonical field name or topic label.
    pub field: String,
    pub message: String,
    pub severity: Severity,
    pub status: FindingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Sheet the affected rows belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<SheetKind>,
    /// 1-based source rows, see [`crate::CanonicalRecord::row`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Finding {
    pub fn new(
        validator: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        status: FindingStatus,
    ) -> Self {
        Self {
            validator: validator.into(),
            field: field.into(),
            message: message.into(),
            severity,
            status,
            suggestion: None,
            sheet: None,
            rows: Vec::new(),
            metadata: None,
        }
    }

    pub fn critical(
        validator: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            validator,
            field,
            message,
            Severity::Critical,
            FindingStatus::Error,
        )
    }

    pub fn warning(
        validator: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            validator,
            field,
            message,
            Severity::Warning,
            FindingStatus::Warning,
        )
    }

    pub fn info(
        validator: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            validator,
            field,
            message,
            Severity::Info,
            FindingStatus::Success,
        )
    }

    /// Finding of the given severity with the status that severity implies.
    pub fn of_severity(
        validator: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        match severity {
            Severity::Critical => Self::critical(validator, field, message),
            Severity::Warning => Self::warning(validator, field, message),
            Severity::Info => Self::info(validator, field, message),
        }
    }

    /// The "all clear" finding a unit emits when it has nothing to report.
    pub fn success(
        validator: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::info(validator, field, message)
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_rows(mut self, sheet: SheetKind, rows: Vec<usize>) -> Self {
        self.sheet = Some(sheet);
        self.rows = rows;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: FindingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_parse_accepts_business_aliases() {
        assert_eq!("Critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!("high".parse::<Severity>().unwrap(), Severity::Warning);
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn constructors_pair_severity_and_status() {
        let finding = Finding::critical("duplicate_detector", "rfc", "duplicado");
        assert_eq!(finding.status, FindingStatus::Error);
        let finding = Finding::success("rfc_validator", "rfc", "sin incidencias");
        assert_eq!(finding.severity, Severity::Info);
        assert_eq!(finding.status, FindingStatus::Success);
    }

    #[test]
    fn optional_parts_are_omitted_from_json() {
        let finding = Finding::warning("age_validator", "birthDate", "edad atípica");
        let json = serde_json::to_value(&finding).unwrap();
        assert!(json.get("rows").is_none());
        assert!(json.get("suggestion").is_none());
        assert_eq!(json["severity"], "warning");
    }
}
