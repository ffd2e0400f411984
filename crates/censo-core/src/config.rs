//! Run configuration loaded from `censo.toml`.
//!
//! ```toml
//! [orchestrator]
//! max_concurrency = 8
//! default_unit_timeout_ms = 30000
//!
//! [orchestrator.unit_timeouts_ms]
//! salary_outlier_analyzer = 60000
//!
//! [policy]
//! valuation_date = "2024-12-31"
//!
//! [[policy.duplicates]]
//! field = "rfc"
//! severity = "critical"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use censo_validate::{ValidationPolicy, ValidatorUnit};

use crate::error::ConfigError;

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_UNIT_TIMEOUT_MS: u64 = 30_000;

/// Dispatch limits for validator units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Units running at the same time.
    pub max_concurrency: usize,
    pub default_unit_timeout_ms: u64,
    /// Per-unit overrides keyed by unit name.
    pub unit_timeouts_ms: BTreeMap<String, u64>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            default_unit_timeout_ms: DEFAULT_UNIT_TIMEOUT_MS,
            unit_timeouts_ms: BTreeMap::new(),
        }
    }
}

impl OrchestratorConfig {
    /// Configured override, then the unit's own declaration, then the default.
    pub fn timeout_for(&self, unit: &dyn ValidatorUnit) -> Duration {
        self.unit_timeouts_ms
            .get(unit.name())
            .map(|ms| Duration::from_millis(*ms))
            .or_else(|| unit.timeout())
            .unwrap_or(Duration::from_millis(self.default_unit_timeout_ms))
    }

    /// Permits handed to the dispatcher; never below one.
    pub fn concurrency_limit(&self) -> usize {
        self.max_concurrency.max(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CensoConfig {
    pub orchestrator: OrchestratorConfig,
    pub policy: ValidationPolicy,
}

impl CensoConfig {
    /// Reads and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.orchestrator.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.orchestrator.default_unit_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.default_unit_timeout_ms must be positive".to_string(),
            ));
        }
        if let Some((name, _)) = self
            .orchestrator
            .unit_timeouts_ms
            .iter()
            .find(|(_, ms)| **ms == 0)
        {
            return Err(ConfigError::Invalid(format!(
                "orchestrator.unit_timeouts_ms.{name} must be positive"
            )));
        }
        self.policy
            .validate()
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use censo_model::{CanonicalField, Severity};
    use censo_validate::default_registry;
    use chrono::NaiveDate;

    #[test]
    fn empty_file_uses_defaults() {
        let config: CensoConfig = toml::from_str("").unwrap();
        assert_eq!(config.orchestrator.max_concurrency, 8);
        assert_eq!(config.orchestrator.default_unit_timeout_ms, 30_000);
        assert_eq!(config.policy.duplicates.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_overrides_and_duplicate_policy() {
        let config: CensoConfig = toml::from_str(
            r#"
            [orchestrator]
            max_concurrency = 2

            [orchestrator.unit_timeouts_ms]
            general_analyst = 500

            [policy]
            valuation_date = "2024-12-31"

            [[policy.duplicates]]
            field = "employeeId"
            severity = "critical"
            "#,
        )
        .unwrap();

        assert_eq!(config.orchestrator.max_concurrency, 2);
        assert_eq!(
            config.policy.valuation_date,
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
        assert_eq!(
            config.policy.duplicate_severity(CanonicalField::EmployeeId),
            Some(Severity::Critical)
        );
        assert_eq!(config.policy.duplicate_severity(CanonicalField::Rfc), None);

        let registry = default_registry();
        let general = registry.get("general_analyst").unwrap();
        let rfc = registry.get("rfc_validator").unwrap();
        assert_eq!(
            config.orchestrator.timeout_for(general.as_ref()),
            Duration::from_millis(500)
        );
        assert_eq!(
            config.orchestrator.timeout_for(rfc.as_ref()),
            Duration::from_millis(30_000)
        );
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config: CensoConfig = toml::from_str("[orchestrator]\nmax_concurrency = 0").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.user_message().contains("max_concurrency"));
        assert_eq!(config.orchestrator.concurrency_limit(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CensoConfig::load(Path::new("/nonexistent/censo.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.suggestion().is_some());
    }
}
